use log::info;
use service::config::Config;
use service::logging::Logger;
use service::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "{} v{} starting up",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let app_state = AppState::new(config.clone());

    // Chunk streams carry their own per-stream expiry; only the periodic
    // registry needs the background sweep.
    engine::sweeper::spawn(
        app_state.event_streams.clone(),
        config.sweep_interval(),
        config.idle_timeout(),
    );

    let router = web::define_routes(app_state);

    let address = format!("{}:{}", config.interface, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|err| panic!("Failed to bind {address}: {err}"));
    info!("Server starting... listening for requests on http://{address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Shutdown signal received, draining connections");
}
