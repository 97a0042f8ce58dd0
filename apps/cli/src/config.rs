//! Connection settings, from flags, the environment or a `.env` file.

use std::time::Duration;

use clap::Args;

pub const DEFAULT_ANKI_URL: &str = "http://localhost:8765";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// AnkiConnect endpoint
    #[arg(long, global = true, env = "MDANKI_ANKI_URL", default_value = DEFAULT_ANKI_URL)]
    pub anki_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "MDANKI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub anki_url: String,
    pub timeout: Duration,
}

impl From<&ConnectionArgs> for Config {
    fn from(args: &ConnectionArgs) -> Self {
        Self {
            anki_url: args.anki_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}
