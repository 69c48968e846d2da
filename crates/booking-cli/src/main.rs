mod cli;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use booking_engine::conflict::describe_conflicts;
use booking_engine::{
    parse_instant, AppointmentDefinition, AppointmentDraft, AppointmentStore, Clock, FixedClock,
    Occurrence, SchedulerConfig, SystemClock, ValidationError,
};

use crate::cli::{CliArgs, Command};

type Store = AppointmentStore<Arc<dyn Clock>>;

/// Accepted layouts for `--file`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    List(Vec<AppointmentDefinition>),
    Wrapped {
        appointments: Vec<AppointmentDefinition>,
    },
}

impl DefinitionFile {
    fn into_definitions(self) -> Vec<AppointmentDefinition> {
        match self {
            Self::List(definitions) | Self::Wrapped { appointments: definitions } => definitions,
        }
    }
}

/// An occurrence with its presentation id spelled out.
#[derive(Serialize)]
struct OccurrenceView<'a> {
    id: String,
    #[serde(flatten)]
    occurrence: &'a Occurrence,
}

impl<'a> From<&'a Occurrence> for OccurrenceView<'a> {
    fn from(occurrence: &'a Occurrence) -> Self {
        Self {
            id: occurrence.id().to_string(),
            occurrence,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    proposed: &'a AppointmentDraft,
    valid: bool,
    errors: &'a [ValidationError],
    conflicts: Vec<OccurrenceView<'a>>,
    summary: String,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let store = open_store(&args)?;

    match args.command {
        Command::Expand { from, to } => {
            let from = parse_optional(from.as_deref(), "--from")?;
            let to = parse_optional(to.as_deref(), "--to")?;
            let occurrences = store.occurrences_between(from, to);
            print_occurrences(&occurrences)?;
        }
        Command::Upcoming { limit } => {
            let occurrences = store.upcoming(limit)?;
            print_occurrences(&occurrences)?;
        }
        Command::Check {
            title,
            start,
            end,
            description,
        } => {
            let start = parse_instant(&start).context("invalid --start")?;
            let end = parse_instant(&end).context("invalid --end")?;
            let mut proposed = AppointmentDraft::new(title, start, end);
            if let Some(description) = description {
                proposed = proposed.with_description(description);
            }
            return check(&store, &proposed);
        }
        Command::Resolve { occurrence_id } => {
            let id = store.resolve_source_id(&occurrence_id)?;
            let definition = store
                .get(&id)
                .with_context(|| format!("appointment '{id}' vanished while resolving"))?;
            print_json(definition)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_store(args: &CliArgs) -> Result<Store> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(timezone) = &args.timezone {
        config.timezone = timezone.clone();
    }

    let clock: Arc<dyn Clock> = match &args.now {
        Some(now) => {
            let pinned = parse_instant(now).context("invalid --now")?;
            debug!(now = %pinned, "pinned clock");
            Arc::new(FixedClock::new(pinned))
        }
        None => Arc::new(SystemClock),
    };

    let definitions = match &args.file {
        Some(path) => load_definitions(path)?,
        None => Vec::new(),
    };

    let store = AppointmentStore::with_clock(config, clock)
        .context("invalid scheduler configuration")?
        .with_definitions(definitions)
        .context("failed to load appointments")?;
    Ok(store)
}

fn load_config(path: &Path) -> Result<SchedulerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let config = SchedulerConfig::from_json(&text)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    info!(path = %path.display(), "loaded scheduler config");
    Ok(config)
}

fn load_definitions(path: &Path) -> Result<Vec<AppointmentDefinition>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read appointments '{}'", path.display()))?;
    let file: DefinitionFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse appointments '{}'", path.display()))?;
    let definitions = file.into_definitions();
    info!(path = %path.display(), count = definitions.len(), "loaded appointments");
    Ok(definitions)
}

fn parse_optional(value: Option<&str>, flag: &str) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|v| parse_instant(v).with_context(|| format!("invalid {flag}")))
        .transpose()
}

fn check(store: &Store, proposed: &AppointmentDraft) -> Result<ExitCode> {
    let outcome = store.check_booking(&proposed.title, proposed.start_time, proposed.end_time);
    let conflicts: Vec<&Occurrence> = outcome.conflicts.iter().collect();

    let report = CheckReport {
        proposed,
        valid: outcome.is_valid(),
        errors: &outcome.errors,
        conflicts: conflicts.iter().copied().map(OccurrenceView::from).collect(),
        summary: describe_conflicts(&conflicts),
    };
    print_json(&report)?;

    if outcome.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_occurrences(occurrences: &[Occurrence]) -> Result<()> {
    let views: Vec<OccurrenceView<'_>> = occurrences.iter().map(OccurrenceView::from).collect();
    print_json(&views)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
