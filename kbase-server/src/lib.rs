//! `kbase-server` exposes the knowledge-base pipeline over HTTP and
//! provides the `kbase` command-line entry point.

pub mod bootstrap;
pub mod config;
pub mod loader;
pub mod protocol;
pub mod server;

pub use bootstrap::build_pipeline;
pub use config::{AppSettings, Cli, Command, ServerConfig, StoreKind};
pub use server::{AppState, app_router, run_server};
