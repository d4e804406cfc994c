//! HTTP server startup and lifecycle management.

use std::future::{IntoFuture, pending};
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::server::{Result, ServerError};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Binds `server_config.server_addr()` and serves `app` until a shutdown
/// signal arrives and in-flight requests drain.
///
/// Requests still running `shutdown_timeout` after the signal are dropped.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> Result<()> {
    if let Err(validation_error) = server_config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %validation_error,
            "invalid server configuration"
        );
        return Err(ServerError::InvalidConfig(validation_error.to_string()));
    }

    let server_addr = server_config.server_addr();
    let listener = match TcpListener::bind(server_addr).await {
        Ok(listener) => listener,
        Err(listener_err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_STARTUP,
                addr = %server_addr,
                error = %listener_err,
                "failed to bind to address"
            );
            return Err(ServerError::BindError {
                address: server_addr.to_string(),
                source: listener_err,
            });
        }
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "server is ready and listening for connections"
    );

    if server_config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "server is bound to all interfaces, ensure firewall rules are configured"
        );
    }

    let (signalled, drain_started) = oneshot::channel();
    let serving = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        termination().await;
        let _ = signalled.send(());
    })
    .into_future();

    let shutdown_timeout = server_config.shutdown_timeout();
    let drain_deadline = async move {
        match drain_started.await {
            Ok(()) => tokio::time::sleep(shutdown_timeout).await,
            Err(_) => pending().await,
        }
    };

    tokio::select! {
        served = serving => served.map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %err,
                "server encountered an error"
            );
            ServerError::Runtime(err)
        })?,
        () = drain_deadline => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "shutdown timeout elapsed, dropping in-flight requests"
            );
            return Ok(());
        }
    }

    tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, "server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT or, on Unix, SIGTERM. A handler that fails to
/// install never resolves.
async fn termination() {
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = pending::<()>();

    let name = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = name,
        "received shutdown signal, draining in-flight requests"
    );
}
