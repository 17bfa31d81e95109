use clap::Parser;
use routemap_web_lib::ViewerArgs;

#[macroquad::main("routemap")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = ViewerArgs::parse();
    if let Err(err) = routemap_web_lib::run(args).await {
        tracing::error!(error = %err, "viewer stopped");
    }
}
