//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── resolver: ResolverConfig        # --config-dir
//! └── command
//!     ├── serve
//!     │   ├── server: ServerConfig        # host, port, shutdown
//!     │   └── middleware: MiddlewareConfig # CORS, request timeout
//!     ├── validate [--strict]
//!     ├── resolve <task> [stage] [parameter]
//!     ├── tasks
//!     └── models [role]
//! ```
//!
//! All options can be provided as arguments or environment variables.

mod middleware;
mod server;

use std::io;
use std::process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use paramlab_server::service::ResolverConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use self::middleware::MiddlewareConfig;
pub use self::server::ServerConfig;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "paramlab")]
#[command(about = "Task-aware parameter resolution for generative pipelines")]
#[command(version)]
pub struct Cli {
    /// Where the configuration documents are read from.
    #[clap(flatten)]
    pub resolver: ResolverConfig,

    #[command(subcommand)]
    pub command: Command,
}

/// What the binary does once the configuration is loaded.
#[derive(Debug, Clone, Subcommand, Serialize, Deserialize)]
pub enum Command {
    /// Serves the HTTP API until SIGINT or SIGTERM.
    Serve(ServeArgs),
    /// Loads and cross-validates every document, then exits.
    Validate(ValidateArgs),
    /// Prints a resolved task, stage or parameter as JSON.
    Resolve(ResolveArgs),
    /// Prints the registered tasks as JSON.
    Tasks,
    /// Prints the model catalog, or the models of one role, as JSON.
    Models(ModelsArgs),
}

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ServeArgs {
    #[clap(flatten)]
    pub server: ServerConfig,

    #[clap(flatten)]
    pub middleware: MiddlewareConfig,
}

#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct ValidateArgs {
    /// Fails when any task override leaves a parameter inconsistent.
    #[arg(long, env = "PARAMLAB_STRICT")]
    pub strict: bool,
}

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ResolveArgs {
    /// Registered task name, e.g. "RAG-based QA".
    pub task: String,
    /// Stage to resolve; every stage of the task when omitted.
    pub stage: Option<String>,
    /// Single parameter of the stage.
    #[arg(requires = "stage")]
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ModelsArgs {
    /// `encoder`, `decoder` or `encoder_decoder`.
    pub role: Option<String>,
}

impl Cli {
    /// Loads `.env` (with the `dotenv` feature) and parses arguments.
    ///
    /// The `.env` file is read first so clap's `env` fallbacks see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Installs the `RUST_LOG` filtered subscriber, defaulting to `info`.
    ///
    /// Logs go to stderr so command output on stdout stays parseable.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );
    }

    /// Validates every configuration value the chosen command uses.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Command::Serve(serve) = &self.command {
            serve
                .server
                .validate()
                .context("invalid server configuration")?;
        }
        Ok(())
    }

    /// Logs configuration at info level.
    pub fn log(&self) {
        Self::log_build_info();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            config_dir = ?self.resolver.config_dir,
            "resolver configuration"
        );

        if let Command::Serve(serve) = &self.command {
            serve.server.log();
            serve.middleware.log();
        }
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_with_stage_and_parameter() {
        let cli = Cli::try_parse_from([
            "paramlab",
            "--config-dir",
            "./config",
            "resolve",
            "RAG-based QA",
            "decoding",
            "top_k",
        ])
        .unwrap();

        assert_eq!(cli.resolver.config_dir.as_deref(), Some(std::path::Path::new("./config")));
        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.task, "RAG-based QA");
        assert_eq!(args.stage.as_deref(), Some("decoding"));
        assert_eq!(args.parameter.as_deref(), Some("top_k"));
    }

    #[test]
    fn serve_defaults_are_valid() {
        let cli = Cli::try_parse_from(["paramlab", "serve"]).unwrap();
        assert!(cli.validate().is_ok());
        let Command::Serve(serve) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.server.port, 3000);
        assert_eq!(serve.middleware.recovery.request_timeout, 30);
    }

    #[test]
    fn validate_is_lenient_unless_strict() {
        let cli = Cli::try_parse_from(["paramlab", "validate"]).unwrap();
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { strict: false })));

        let cli = Cli::try_parse_from(["paramlab", "validate", "--strict"]).unwrap();
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { strict: true })));
    }

    #[test]
    fn serve_rejects_privileged_port() {
        let cli = Cli::try_parse_from(["paramlab", "serve", "--port", "80"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
