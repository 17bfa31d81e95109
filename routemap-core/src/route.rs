use crate::coordinates::Waypoint;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route descriptor is not valid JSON or has the wrong shape: {0}")]
    Json(#[from] serde_json::Error),
    #[error("waypoint {index} has a non-finite coordinate")]
    NonFiniteWaypoint { index: usize },
}

/// Ordered waypoints from start to destination, as sent by the route backend:
/// `{ "path": [ { "x": 100, "y": 400 }, ... ] }`.
///
/// A missing or `null` path is the same as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    #[serde(default, deserialize_with = "null_as_empty")]
    path: Vec<Waypoint>,
}

impl RouteDescriptor {
    pub fn new(path: Vec<Waypoint>) -> Self {
        Self { path }
    }

    pub fn from_points(points: &[(f32, f32)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| Waypoint::new(x, y)).collect())
    }

    /// Parses a descriptor and rejects any waypoint lacking a numeric coordinate.
    pub fn from_json(raw: &str) -> Result<Self, RouteError> {
        let route: Self = serde_json::from_str(raw)?;
        route.validate()?;
        Ok(route)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, RouteError> {
        let route: Self = serde_json::from_value(value)?;
        route.validate()?;
        Ok(route)
    }

    /// Like [`from_json`](Self::from_json), but a malformed descriptor is
    /// logged and read as an empty route.
    pub fn from_json_lenient(raw: &str) -> Self {
        Self::from_json(raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "malformed route descriptor; treating as empty");
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        match self.path.iter().position(|waypoint| !waypoint.is_finite()) {
            Some(index) => Err(RouteError::NonFiniteWaypoint { index }),
            None => Ok(()),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.path
    }

    pub fn destination(&self) -> Option<Waypoint> {
        self.path.last().copied()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Waypoint>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Waypoint>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_payload_in_order() {
        let route = RouteDescriptor::from_json(
            r#"{"path":[{"x":100,"y":400},{"x":250.5,"y":500},{"x":700,"y":350}]}"#,
        )
        .unwrap();

        assert_eq!(route.len(), 3);
        assert_eq!(route.waypoints()[0], Waypoint::new(100.0, 400.0));
        assert_eq!(route.waypoints()[1], Waypoint::new(250.5, 500.0));
        assert_eq!(route.destination(), Some(Waypoint::new(700.0, 350.0)));
    }

    #[test]
    fn missing_or_null_path_is_empty() {
        assert!(RouteDescriptor::from_json("{}").unwrap().is_empty());
        assert!(RouteDescriptor::from_json(r#"{"path":null}"#).unwrap().is_empty());
        assert!(RouteDescriptor::from_json(r#"{"path":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn rejects_waypoint_without_numeric_coordinate() {
        assert!(matches!(
            RouteDescriptor::from_json(r#"{"path":[{"x":1,"y":2},{"x":3}]}"#),
            Err(RouteError::Json(_))
        ));
        assert!(matches!(
            RouteDescriptor::from_json(r#"{"path":[{"x":"left","y":2}]}"#),
            Err(RouteError::Json(_))
        ));
    }

    #[test]
    fn lenient_parse_keeps_valid_routes() {
        let route =
            RouteDescriptor::from_json_lenient(r#"{"path":[{"x":1,"y":2},{"x":3,"y":4}]}"#);
        assert_eq!(route, RouteDescriptor::from_points(&[(1.0, 2.0), (3.0, 4.0)]));
    }

    #[test]
    fn lenient_parse_drops_malformed_routes_entirely() {
        let missing_y = r#"{"path":[{"x":1,"y":2},{"x":3}]}"#;
        assert!(RouteDescriptor::from_json_lenient(missing_y).is_empty());
        assert!(RouteDescriptor::from_json_lenient("not json").is_empty());
        assert!(RouteDescriptor::from_json_lenient(r#"{"path":[{"x":1e999,"y":2}]}"#).is_empty());
    }

    #[test]
    fn rejects_non_finite_waypoints() {
        let route =
            RouteDescriptor::new(vec![Waypoint::new(1.0, 1.0), Waypoint::new(f32::NAN, 2.0)]);
        assert!(matches!(
            route.validate(),
            Err(RouteError::NonFiniteWaypoint { index: 1 })
        ));
    }

    #[test]
    fn from_value_accepts_embedded_payload() {
        let value = serde_json::json!({ "path": [{ "x": 5, "y": 6 }] });
        let route = RouteDescriptor::from_value(value).unwrap();
        assert_eq!(route.destination(), Some(Waypoint::new(5.0, 6.0)));
    }
}
