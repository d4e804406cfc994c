#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod server;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use paramlab_core::ConfigResolver;
use paramlab_server::handler::routes;
use paramlab_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use paramlab_server::service::ServiceState;

use crate::config::{Cli, Command, MiddlewareConfig, ServeArgs};
use crate::server::ServerError;

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "paramlab_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "paramlab_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "paramlab_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if let Some(server_error) = error.downcast_ref::<ServerError>() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error_code = server_error.error_code(),
            suggestion = server_error.suggestion(),
            "server failed"
        );
    }

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let resolver = cli
        .resolver
        .load_resolver()
        .context("failed to load configuration")?;

    match &cli.command {
        Command::Serve(serve) => serve_api(resolver, serve).await,
        Command::Validate(args) => command::print(&command::validate(&resolver, args)?),
        Command::Resolve(args) => command::print(&command::resolve(&resolver, args)?),
        Command::Tasks => command::print(&command::tasks(&resolver)?),
        Command::Models(args) => command::print(&command::models(&resolver, args)?),
    }
}

/// Serves the API, then closes the resolver so no reload runs after exit.
async fn serve_api(resolver: ConfigResolver, serve: &ServeArgs) -> anyhow::Result<()> {
    let snapshot = resolver.snapshot();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        generation = snapshot.generation(),
        tasks = resolver.registry().len(),
        models = resolver.models().len(),
        "starting paramlab server"
    );

    let state = ServiceState::new(resolver);
    let resolver: Arc<ConfigResolver> = state.resolver().clone();
    let router = create_router(state, &serve.middleware);

    let served = server::serve_http(router, serve.server.clone()).await;
    resolver.close();
    served?;

    Ok(())
}

/// Applies middleware from innermost to outermost: security, timing,
/// observability, recovery.
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes()
        .with_state(state)
        .with_security(&middleware.cors)
        .with_timing()
        .with_observability()
        .with_recovery(&middleware.recovery)
}
