use std::error::Error;
use std::path::PathBuf;
use std::time::SystemTime;

use clap::Parser;
use macroquad::prelude::*;
use routemap_core::RouteDescriptor;
use routemap_overlay::{
    FloorplanReference, ImageLoader, OverlayConfig, RenderPhase, RouteOverlayRenderer,
};

const ROUTE_POLL_SECS: f64 = 1.0;
const STATUS_TEXT_SIZE: f32 = 24.0;

/// Show a floorplan with its route overlay. The route file is re-read when it
/// changes on disk.
#[derive(Parser, Debug, Clone)]
#[command(name = "routemap-web")]
pub struct ViewerArgs {
    /// Floorplan image: a file path or an http(s) URL.
    pub floorplan: String,

    /// Route descriptor JSON.
    #[arg(short, long)]
    pub route: Option<PathBuf>,

    /// OverlayConfig JSON.
    #[arg(long, env = "ROUTEMAP_CONFIG")]
    pub config: Option<PathBuf>,
}

struct RouteFile {
    path: PathBuf,
    /// `Some` once polled; holds the modification time seen then, `None`
    /// inside when the file was unreadable.
    seen: Option<Option<SystemTime>>,
}

impl RouteFile {
    fn new(path: PathBuf) -> Self {
        Self { path, seen: None }
    }

    /// Returns the freshly parsed route when the file changed since the last
    /// poll. A missing file yields no route and is reported once.
    fn poll(&mut self) -> Option<Option<RouteDescriptor>> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok();
        if self.seen == Some(modified) {
            return None;
        }
        self.seen = Some(modified);

        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let _route = tracing::info_span!("route", path = %self.path.display()).entered();
                Some(Some(RouteDescriptor::from_json_lenient(&raw)))
            }
            Err(err) => {
                tracing::warn!(
                    route = %self.path.display(),
                    error = %err,
                    "route unavailable; showing floorplan only"
                );
                Some(None)
            }
        }
    }
}

struct ViewerState {
    renderer: RouteOverlayRenderer<ImageLoader>,
    floorplan: FloorplanReference,
    route_file: Option<RouteFile>,
    texture: Option<Texture2D>,
    shown_frame: u64,
    last_poll: f64,
}

impl ViewerState {
    fn new(renderer: RouteOverlayRenderer<ImageLoader>, args: &ViewerArgs) -> Self {
        let mut state = Self {
            renderer,
            floorplan: FloorplanReference::parse(&args.floorplan),
            route_file: args.route.clone().map(RouteFile::new),
            texture: None,
            shown_frame: 0,
            last_poll: get_time(),
        };

        let route = state.route_file.as_mut().and_then(RouteFile::poll).flatten();
        state.renderer.render(state.floorplan.clone(), route);
        state
    }

    fn update(&mut self) {
        let now = get_time();
        if now - self.last_poll >= ROUTE_POLL_SECS {
            self.last_poll = now;
            if let Some(route) = self.route_file.as_mut().and_then(RouteFile::poll) {
                self.renderer.render(self.floorplan.clone(), route);
            }
        }

        let status = self.renderer.status();
        if status.phase != RenderPhase::Overlaid {
            self.texture = None;
            return;
        }
        if status.frames_drawn == self.shown_frame && self.texture.is_some() {
            return;
        }

        self.shown_frame = status.frames_drawn;
        self.texture = self.renderer.snapshot().and_then(|image| {
            let (Ok(width), Ok(height)) =
                (u16::try_from(image.width()), u16::try_from(image.height()))
            else {
                tracing::warn!(
                    width = image.width(),
                    height = image.height(),
                    "floorplan too large for a texture"
                );
                return None;
            };
            let texture = Texture2D::from_rgba8(width, height, image.as_raw());
            texture.set_filter(FilterMode::Linear);
            Some(texture)
        });
    }

    fn render(&self) {
        clear_background(BLACK);

        let Some(texture) = &self.texture else {
            draw_text("loading floorplan...", 20.0, 40.0, STATUS_TEXT_SIZE, WHITE);
            return;
        };

        let area = fit_rect(
            vec2(texture.width(), texture.height()),
            vec2(screen_width(), screen_height()),
        );
        draw_texture_ex(
            texture,
            area.x,
            area.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(area.w, area.h)),
                ..Default::default()
            },
        );
    }
}

/// Largest rect with the image's aspect ratio that fits the screen, centred.
fn fit_rect(image: Vec2, screen: Vec2) -> Rect {
    if image.x <= 0.0 || image.y <= 0.0 {
        return Rect::new(0.0, 0.0, 0.0, 0.0);
    }

    let scale = (screen.x / image.x).min(screen.y / image.y);
    let size = image * scale;
    let origin = (screen - size) * 0.5;
    Rect::new(origin.x, origin.y, size.x, size.y)
}

pub async fn run(args: ViewerArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("routemap-decode")
        .enable_all()
        .build()?;
    let renderer =
        RouteOverlayRenderer::with_loader_on(ImageLoader::new(), config, runtime.handle().clone())?;
    let mut viewer = ViewerState::new(renderer, &args);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        viewer.update();
        viewer.render();

        next_frame().await;
    }

    drop(viewer);
    runtime.shutdown_background();
    Ok(())
}
