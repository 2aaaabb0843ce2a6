/**
 * Tourfleet Server Entry Point
 *
 * Loads configuration, builds the Axum app and serves it until Ctrl+C.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use tourfleet::backend::server::init::create_app;
    use tourfleet::shared::config::AppConfig;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tourfleet=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = match create_app(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "ssr")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin tourfleet-server --features ssr");
    std::process::exit(1);
}
