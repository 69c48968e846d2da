use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Expand appointment schedules and check proposed bookings.
///
/// Reads appointment definitions from a JSON file and writes JSON to stdout.
/// Diagnostics go to stderr (set `RUST_LOG` to see more).
#[derive(Parser, Debug)]
#[command(name = "booking", version, about)]
pub struct CliArgs {
    /// Appointment definitions: a JSON array, or an object with an
    /// `appointments` array. An empty schedule is used if omitted.
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Scheduler configuration (JSON). Defaults apply if omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// IANA timezone for calendar arithmetic, overriding the config file
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Pin "now" to an RFC 3339 instant instead of the system clock
    #[arg(long, global = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every occurrence, sorted by start
    Expand {
        /// Only occurrences ending after this instant
        #[arg(long)]
        from: Option<String>,

        /// Only occurrences starting before this instant
        #[arg(long)]
        to: Option<String>,
    },

    /// Print the next occurrences starting today or later
    Upcoming {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Validate a proposed booking; exits 1 if any rule fails
    Check {
        #[arg(long)]
        title: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Print the definition that owns an occurrence id
    Resolve {
        /// Occurrence id, `<appointment id>-<index>`
        occurrence_id: String,
    },
}
