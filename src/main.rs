use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use grandpearl::interface::Dashboard;
use grandpearl::server;
use grandpearl::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // an optional path to a settings file is the only argument
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let bind = settings.server.bind.clone();
    let dashboard = Arc::new(Dashboard::new(settings));
    dashboard.bootstrap()?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(address = %bind, "Grand Pearl dashboard listening");
    axum::serve(
        listener,
        server::router(dashboard).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
