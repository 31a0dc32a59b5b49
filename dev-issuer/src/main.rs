use dev_issuer::IssuerState;
use log::{error, info};
use std::net::SocketAddr;

/// Serves the demo issuer, by default at http://localhost:5001 (where the
/// gateway looks for it).
#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let port: u16 = match std::env::var("ISSUER_PORT") {
        Ok(value) => match value.parse() {
            Ok(port) => port,
            Err(e) => {
                error!("Invalid ISSUER_PORT '{}': {}", value, e);
                std::process::exit(1);
            }
        },
        Err(_) => 5001,
    };
    let issuer_url =
        std::env::var("ISSUER_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

    let issuer = match IssuerState::demo(&issuer_url) {
        Ok(issuer) => issuer,
        Err(e) => {
            error!("Failed to initialize issuer: {}", e);
            std::process::exit(1);
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Issuer '{}' running on {}, press Ctrl+C to stop", issuer_url, addr);
    if let Err(e) = axum::serve(listener, issuer.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
