//! Process-wide configuration and command-line argument capture.
//!
//! Modelled on `io-engine::core::env::MayastorCliArgs`: a `clap::Parser`
//! struct captured once at process start, then emitted under `Local` scope
//! as part of startup so any reactor can observe what the process was
//! launched with.
use clap::Parser;
use serde::{Deserialize, Serialize};

fn default_pool_concurrency() -> String {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .to_string()
}

/// Command-line arguments captured for a running [`crate::powerplant::PowerPlant`].
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[clap(name = "nuclear", about = "NUClear-style reactor runtime host process")]
pub struct RuntimeCliArgs {
    /// Size of the unnamed default pool. Defaults to hardware concurrency,
    /// falling back to 2 if it cannot be determined.
    #[clap(short = 'j', long = "default-pool-concurrency", default_value_t = default_pool_concurrency_value())]
    pub default_pool_concurrency: u32,

    /// Log format: "compact" (default) or "json".
    #[clap(short = 'F', long = "log-format", default_value = "compact")]
    pub log_format: String,

    /// Disable ANSI colour in log output.
    #[clap(long = "no-colour")]
    pub no_colour: bool,
}

fn default_pool_concurrency_value() -> u32 {
    default_pool_concurrency().parse().unwrap_or(2)
}

impl Default for RuntimeCliArgs {
    fn default() -> Self {
        Self {
            default_pool_concurrency: default_pool_concurrency_value(),
            log_format: "compact".to_string(),
            no_colour: false,
        }
    }
}

impl RuntimeCliArgs {
    /// Parse from `std::env::args()`, the way a `main()` would.
    pub fn from_env() -> Self {
        Self::parse()
    }
}
