use image::Rgba;
use routemap_core::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const ROUTE_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Visual weight of the route overlay, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    #[serde(serialize_with = "serialize_color", deserialize_with = "deserialize_color")]
    pub color: Rgba<u8>, // shared by path and destination marker
    pub line_width: f32,
    pub marker_radius: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: ROUTE_RED,
            line_width: 3.0,
            marker_radius: 8.0,
        }
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("line_width", self.line_width),
            ("marker_radius", self.marker_radius),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidStyle { field, value });
            }
        }
        Ok(())
    }
}

/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa` and a few names.
pub fn parse_color(raw: &str) -> Result<Rgba<u8>, ConfigError> {
    let value = raw.trim().to_lowercase();
    let parsed = match value.as_str() {
        "red" => Some(ROUTE_RED),
        "black" => Some(Rgba([0, 0, 0, 255])),
        "white" => Some(Rgba([255, 255, 255, 255])),
        _ if value.starts_with('#') => parse_hex_color(&value),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidColor(raw.to_string()))
}

fn parse_hex_color(raw: &str) -> Option<Rgba<u8>> {
    let digits = raw.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();

    match digits.len() {
        3 => {
            let r = channel(0..1)?;
            let g = channel(1..2)?;
            let b = channel(2..3)?;
            Some(Rgba([r * 17, g * 17, b * 17, 255]))
        }
        6 => Some(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])),
        8 => Some(Rgba([
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        ])),
        _ => None,
    }
}

pub fn format_color(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

fn serialize_color<S: Serializer>(color: &Rgba<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_color(*color))
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgba<u8>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_color(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_red_three_pixel_line() {
        let style = OverlayStyle::default();
        assert_eq!(style.color, Rgba([255, 0, 0, 255]));
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.marker_radius, 8.0);
        assert!(style.validate().is_ok());
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#f00").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#1e90ff").unwrap(), Rgba([30, 144, 255, 255]));
        assert_eq!(parse_color("#1E90FF80").unwrap(), Rgba([30, 144, 255, 128]));
        assert_eq!(parse_color(" red ").unwrap(), ROUTE_RED);
        assert!(parse_color("#12").is_err());
        assert!(parse_color("#zzzzzz").is_err());
        assert!(parse_color("chartreuse").is_err());
    }

    #[test]
    fn color_survives_json() {
        let style = OverlayStyle {
            color: Rgba([30, 144, 255, 128]),
            ..OverlayStyle::default()
        };
        let json = serde_json::to_string(&style).unwrap();
        assert!(json.contains("\"#1e90ff80\""));
        let restored: OverlayStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, style);
    }

    #[test]
    fn rejects_non_positive_weights() {
        let style = OverlayStyle {
            line_width: 0.0,
            ..OverlayStyle::default()
        };
        assert!(matches!(
            style.validate(),
            Err(ConfigError::InvalidStyle { field: "line_width", .. })
        ));

        let style = OverlayStyle {
            marker_radius: f32::NAN,
            ..OverlayStyle::default()
        };
        assert!(style.validate().is_err());
    }
}
