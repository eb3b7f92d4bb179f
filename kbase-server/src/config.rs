//! Command-line and environment configuration.
//!
//! Every setting can be given as a flag or through its environment
//! variable; flags win.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use kbase_rag::config::DEFAULT_COLLECTION;

/// Embedding width used in offline mode when none is configured.
pub const OFFLINE_DIMENSIONS: usize = 384;

/// Knowledge-base question answering service.
#[derive(Debug, Parser)]
#[command(name = "kbase", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub settings: AppSettings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Index a JSON knowledge-base file and exit.
    Load {
        /// Path to a JSON array of `{title, content, category, tags, last_updated}` entries.
        file: PathBuf,
    },
}

/// Which vector store backs the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local store; contents are lost on exit.
    Memory,
    /// ChromaDB over HTTP.
    Chroma,
}

#[derive(Debug, Clone, Args)]
pub struct AppSettings {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "KBASE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[arg(long, env = "KBASE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Vector-store collection holding the knowledge base.
    #[arg(long, env = "KBASE_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Vector store backend.
    #[arg(long, env = "KBASE_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Base URL of the ChromaDB server.
    #[arg(long, env = "KBASE_CHROMA_URL", default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Use hash embeddings and canned answers instead of OpenAI.
    ///
    /// The environment variable accepts `1`/`0`, `true`/`false`, `yes`/`no`
    /// and `on`/`off`.
    #[arg(
        long,
        env = "KBASE_OFFLINE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub offline: bool,

    /// OpenAI API key; required unless running offline.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Embedding model name.
    #[arg(long, env = "KBASE_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Chat model used to compose answers.
    #[arg(long, env = "KBASE_CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Embedding width; also the hash-embedding width in offline mode.
    #[arg(long, env = "KBASE_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,
}

/// Where the HTTP server listens.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl AppSettings {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig { host: self.host.clone(), port: self.port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sets an environment variable for the guard's lifetime.
    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn new(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: only this test touches KBASE_OFFLINE through the environment.
            unsafe { std::env::set_var(key, value) };
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: see `EnvGuard::new`.
            unsafe {
                match &self.prev {
                    Some(value) => std::env::set_var(self.key, value),
                    None => std::env::remove_var(self.key),
                }
            }
        }
    }

    #[test]
    fn offline_env_accepts_numeric_and_word_booleans() {
        for (value, expected) in [("1", true), ("yes", true), ("true", true), ("0", false), ("off", false)] {
            let _guard = EnvGuard::new("KBASE_OFFLINE", value);
            let cli = Cli::try_parse_from(["kbase"]).unwrap();
            assert_eq!(cli.settings.offline, expected, "KBASE_OFFLINE={value}");
        }
    }

    #[test]
    fn flags_select_store_and_mode() {
        let cli = Cli::try_parse_from([
            "kbase",
            "--offline",
            "--store",
            "chroma",
            "--collection",
            "team_docs",
            "--port",
            "9000",
        ])
        .unwrap();

        assert!(cli.settings.offline);
        assert_eq!(cli.settings.store, StoreKind::Chroma);
        assert_eq!(cli.settings.collection, "team_docs");
        assert_eq!(cli.settings.server_config().port, 9000);
        assert!(cli.command.is_none());
    }

    #[test]
    fn load_subcommand_takes_a_path() {
        let cli = Cli::try_parse_from(["kbase", "load", "kb.json"]).unwrap();
        match cli.command {
            Some(Command::Load { file }) => assert_eq!(file, PathBuf::from("kb.json")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_store() {
        assert!(Cli::try_parse_from(["kbase", "--store", "qdrant"]).is_err());
    }
}
