//! Error taxonomy for the runtime, following the Configuration/Resource split
//! the core's error handling design calls for. Runtime-transient conditions
//! (missing data, blocked preconditions) are not represented here at all —
//! they surface as [`crate::emit::ReactionEvent`] messages, never as a
//! `Result`.
use snafu::Snafu;

/// Errors that indicate the runtime was misconfigured by its caller. These
/// are fatal: the process should terminate after best-effort teardown.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigurationError {
    #[snafu(display("a PowerPlant already exists in this process"))]
    DuplicatePowerPlant,

    #[snafu(display(
        "reaction '{name}' was bound with no word contributing a bind hook"
    ))]
    NoBindHook { name: String },

    #[snafu(display(
        "reaction '{name}' combines Always (run_inline=Always) with Never \
         (run_inline=Never); this is a contradiction"
    ))]
    RunInlineConflict { name: String },

    #[snafu(display("PowerPlant::start called more than once"))]
    AlreadyStarted,

    #[snafu(display("unknown pool '{pool}' referenced before it was registered"))]
    UnknownPool { pool: String },
}

/// Errors raised while acquiring scheduler resources (threads, pools).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ResourceError {
    #[snafu(display("failed to spawn worker thread for pool '{pool}': {source}"))]
    ThreadSpawn {
        pool: String,
        source: std::io::Error,
    },

    #[snafu(display("pool '{pool}' requested zero worker threads"))]
    EmptyPool { pool: String },
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
pub type ResourceResult<T> = Result<T, ResourceError>;
