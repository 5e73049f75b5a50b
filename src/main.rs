use supercookie_core::{ServerBuilder, ServerConfig};
use supercookie_transport::SupercookieServer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    info!("Favicon supercookie demonstration server (research use only)");

    let config = ServerConfig::load().inspect_err(|e| error!("Configuration rejected: {e}"))?;
    let builder = ServerBuilder::new().with_config(config);

    SupercookieServer::from_builder(builder)
        .start()
        .await
        .inspect_err(|e| error!("Server stopped: {e}"))?;

    Ok(())
}
