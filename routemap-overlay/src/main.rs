#![cfg(feature = "cli")]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use routemap_core::{ReferenceSpace, RouteDescriptor};
use routemap_overlay::style::parse_color;
use routemap_overlay::{FloorplanReference, OverlayConfig, RenderPhase, RouteOverlayRenderer};

/// Composite a route over a floorplan image and write the result as an image.
#[derive(Parser, Debug)]
#[command(name = "routemap-overlay")]
struct Cli {
    /// Floorplan image: a file path or an http(s) URL.
    floorplan: String,

    /// Output image; format follows the extension.
    #[arg(short, long, default_value = "route.png")]
    output: PathBuf,

    /// Route descriptor JSON (`{"path":[{"x":..,"y":..}]}`). Omit for the bare floorplan.
    #[arg(short, long)]
    route: Option<PathBuf>,

    /// OverlayConfig JSON; flags below override it.
    #[arg(long, env = "ROUTEMAP_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    ref_width: Option<f32>,

    #[arg(long)]
    ref_height: Option<f32>,

    #[arg(long)]
    line_width: Option<f32>,

    #[arg(long)]
    marker_radius: Option<f32>,

    /// `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long)]
    color: Option<String>,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Cli {
    fn overlay_config(&self) -> Result<OverlayConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => OverlayConfig::load(path)?,
            None => OverlayConfig::default(),
        };

        let reference = ReferenceSpace {
            width: self.ref_width.unwrap_or(config.reference.width),
            height: self.ref_height.unwrap_or(config.reference.height),
        };
        config.reference = reference;
        if let Some(width) = self.line_width {
            config.style.line_width = width;
        }
        if let Some(radius) = self.marker_radius {
            config.style.marker_radius = radius;
        }
        if let Some(color) = &self.color {
            config.style.color = parse_color(color)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn read_route(path: &Path) -> Result<RouteDescriptor, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;

    let _route = tracing::info_span!("route", path = %path.display()).entered();
    Ok(RouteDescriptor::from_json_lenient(&raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.overlay_config()?;
    let route = match &cli.route {
        Some(path) => Some(read_route(path)?),
        None => None,
    };

    let floorplan = FloorplanReference::parse(&cli.floorplan);
    if let FloorplanReference::Path(path) = &floorplan {
        tokio::fs::metadata(path)
            .await
            .map_err(|err| format!("failed to read floorplan {}: {err}", path.display()))?;
    }

    let renderer = RouteOverlayRenderer::new(config)?;
    renderer.render(floorplan, route);

    let mut status = renderer.subscribe();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let settled = tokio::time::timeout(
        timeout,
        status.wait_for(|status| {
            status.phase == RenderPhase::Overlaid || status.decodes_failed > 0
        }),
    )
    .await
    .map(|result| result.map(|status| *status));
    match settled {
        Ok(Ok(status)) if status.phase == RenderPhase::Overlaid => {}
        Ok(Ok(_)) => {
            return Err(format!("floorplan {} failed to load (see log)", cli.floorplan).into());
        }
        Ok(Err(_)) => return Err("renderer stopped before drawing".into()),
        Err(_) => {
            return Err(format!(
                "floorplan {} was not drawn within {}s",
                cli.floorplan, cli.timeout_secs
            )
            .into());
        }
    }

    let image = renderer
        .snapshot()
        .ok_or("renderer finished without a surface")?;
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(&cli.output)?;
    println!(
        "wrote {} ({}x{})",
        cli.output.display(),
        image.width(),
        image.height()
    );

    Ok(())
}
