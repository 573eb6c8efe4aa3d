use clap::{Parser, Subcommand};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Bearer token for the chat completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: ApiKey,

    /// Chat completion endpoint used to classify accounts
    #[arg(
        long,
        env = "COA_ENDPOINT",
        default_value = "https://api.openai.com/v1/chat/completions"
    )]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[arg(long, env = "COA_MODEL", default_value = "gpt-4-turbo")]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "COA_TEMPERATURE", default_value = "0.5")]
    pub temperature: f32,

    /// Maximum output tokens per batch
    #[arg(long, env = "COA_MAX_TOKENS", default_value = "1000")]
    pub max_tokens: u32,

    /// Number of accounts sent in one classification request
    #[arg(long, env = "BATCH_SIZE", default_value = "15")]
    pub batch_size: NonZeroUsize,

    /// Upper bound on batches in flight at once (unbounded when unset)
    #[arg(long, env = "MAX_CONCURRENT_BATCHES")]
    pub max_concurrent_batches: Option<NonZeroUsize>,

    /// Per-request timeout in seconds for the chat completion endpoint
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Comma separated list of account types replacing the built-in taxonomy
    #[arg(long, env = "COA_TAXONOMY", value_delimiter = ',')]
    pub taxonomy: Vec<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP classification service
    Serve {
        /// Server host to bind to
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Server port to bind to
        #[arg(long, env = "PORT", default_value = "8000")]
        port: u16,
    },
    /// Map a trial balance file to a chart-of-accounts CSV
    Map {
        /// Trial balance (.xlsx, .xls, .xlsb, .ods, .csv or .tsv)
        #[arg(long, short)]
        input: PathBuf,

        /// Destination CSV
        #[arg(long, short, default_value = "mapped_coa.csv")]
        output: PathBuf,

        /// Report header rows preceding the account lines
        #[arg(long, default_value = "5")]
        skip_rows: usize,
    },
}

/// API credential. Never printed in full.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Everything the classification pipeline needs, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: ApiKey,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub batch_size: NonZeroUsize,
    pub max_concurrent_batches: Option<NonZeroUsize>,
    pub request_timeout: Duration,
    pub taxonomy: Taxonomy,
}

impl TryFrom<&Config> for ClassifierConfig {
    type Error = anyhow::Error;

    fn try_from(config: &Config) -> anyhow::Result<Self> {
        let taxonomy = if config.taxonomy.is_empty() {
            Taxonomy::default()
        } else {
            Taxonomy::new(config.taxonomy.iter().map(|t| t.trim().to_string()))
        };
        if taxonomy.categories().is_empty() {
            anyhow::bail!("--taxonomy must name at least one account type");
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            batch_size: config.batch_size,
            max_concurrent_batches: config.max_concurrent_batches,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            taxonomy,
        })
    }
}

impl Config {
    pub fn server_address(&self) -> Option<String> {
        match &self.command {
            Command::Serve { host, port } => Some(format!("{}:{}", host, port)),
            Command::Map { .. } => None,
        }
    }
}
