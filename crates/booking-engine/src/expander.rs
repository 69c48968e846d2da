//! Recurrence expansion: definition → concrete occurrences.
//!
//! Expansion is eager and always finite. A series runs from the definition's
//! own start to its `end_date` (inclusive), or, when no end date is given, to
//! local midnight of "today" plus the configured horizon (90 days by
//! default).
//!
//! The n-th start is computed from the series anchor (`start + n periods`)
//! rather than by stepping from the previous start, so a monthly series that
//! begins on the 31st returns to the 31st after passing through February.
//! Every occurrence keeps the definition's exact duration.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::appointment::{AppointmentDefinition, Frequency, Occurrence};
use crate::calendar::Calendar;
use crate::config::{SchedulerConfig, DEFAULT_RECURRENCE_HORIZON_DAYS};
use crate::error::ScheduleError;

/// Calendar and horizon used to materialize a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    pub calendar: Calendar,
    /// Days past local midnight of "now" that open-ended series run to.
    pub horizon_days: i64,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            calendar: Calendar::utc(),
            horizon_days: DEFAULT_RECURRENCE_HORIZON_DAYS,
        }
    }
}

impl ExpandOptions {
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, ScheduleError> {
        Ok(Self {
            calendar: config.calendar()?,
            horizon_days: config.default_horizon_days,
        })
    }
}

/// Expand one definition into its occurrences, in chronological order.
///
/// A definition without a recurrence rule (or with [`Frequency::None`])
/// yields exactly one occurrence equal to its own interval. A recurring one
/// yields zero or more; an `end_date` before the start is not an error, it
/// simply produces nothing.
///
/// # Examples
///
/// ```
/// use booking_engine::appointment::{
///     AppointmentDefinition, AppointmentDraft, AppointmentId, Frequency, Recurrence,
/// };
/// use booking_engine::expander::{expand, ExpandOptions};
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2026, 3, 17, 9, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 3, 17, 9, 30, 0).unwrap();
/// let until = Utc.with_ymd_and_hms(2026, 3, 31, 9, 0, 0).unwrap();
/// let def = AppointmentDefinition::from_draft(
///     AppointmentId::from("standup"),
///     AppointmentDraft::new("Standup", start, end)
///         .with_recurrence(Recurrence::new(Frequency::Weekly).until(until)),
/// );
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap();
/// let occurrences = expand(&def, now, &ExpandOptions::default());
/// assert_eq!(occurrences.len(), 3); // Mar 17, Mar 24, Mar 31
/// assert_eq!(occurrences[2].id().to_string(), "standup-2");
/// ```
pub fn expand(
    definition: &AppointmentDefinition,
    now: DateTime<Utc>,
    options: &ExpandOptions,
) -> Vec<Occurrence> {
    let occurrences: Vec<Occurrence> = match series_starts(definition, now, options) {
        Ok(starts) => starts
            .enumerate()
            .map(|(index, start)| materialize(definition, index, start))
            .collect(),
        Err(e) => {
            warn!(id = %definition.id, error = %e, "cannot compute recurrence horizon");
            Vec::new()
        }
    };
    debug!(
        id = %definition.id,
        frequency = ?definition.frequency(),
        count = occurrences.len(),
        "expanded appointment"
    );
    occurrences
}

/// Expand every definition, concatenated in definition order.
///
/// No ordering across definitions is implied; sort by start if needed.
pub fn expand_all<'a, I>(
    definitions: I,
    now: DateTime<Utc>,
    options: &ExpandOptions,
) -> Vec<Occurrence>
where
    I: IntoIterator<Item = &'a AppointmentDefinition>,
{
    definitions
        .into_iter()
        .flat_map(|definition| expand(definition, now, options))
        .collect()
}

/// How many occurrences [`expand`] would produce, counting at most
/// `stop_after + 1` so oversized series are detected without materializing
/// them.
///
/// # Errors
///
/// Returns [`ScheduleError::OutOfRange`] when the series' last start cannot
/// be computed. [`expand`] yields nothing for such a series, so callers that
/// guard writes must not read it as zero.
pub fn count_occurrences(
    definition: &AppointmentDefinition,
    now: DateTime<Utc>,
    options: &ExpandOptions,
    stop_after: usize,
) -> Result<usize, ScheduleError> {
    Ok(series_starts(definition, now, options)?
        .take(stop_after.saturating_add(1))
        .count())
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// The start instant of every occurrence in the series.
fn series_starts<'a>(
    definition: &'a AppointmentDefinition,
    now: DateTime<Utc>,
    options: &'a ExpandOptions,
) -> Result<Box<dyn Iterator<Item = DateTime<Utc>> + 'a>, ScheduleError> {
    let frequency = definition.frequency();
    if frequency == Frequency::None {
        return Ok(Box::new(std::iter::once(definition.start_time)));
    }

    let limit = series_limit(definition, now, options)?;

    let calendar = options.calendar;
    let anchor = definition.start_time;
    Ok(Box::new(
        (0u32..)
            .map_while(move |n| nth_start(&calendar, anchor, frequency, n).ok())
            .take_while(move |start| *start <= limit),
    ))
}

/// Inclusive upper bound for occurrence starts.
fn series_limit(
    definition: &AppointmentDefinition,
    now: DateTime<Utc>,
    options: &ExpandOptions,
) -> Result<DateTime<Utc>, ScheduleError> {
    match definition.recurrence.and_then(|r| r.end_date) {
        Some(end_date) => Ok(end_date),
        None => {
            let today = options.calendar.start_of_day(now)?;
            options.calendar.add_days(today, options.horizon_days)
        }
    }
}

/// `anchor` shifted by `n` periods of `frequency`.
fn nth_start(
    calendar: &Calendar,
    anchor: DateTime<Utc>,
    frequency: Frequency,
    n: u32,
) -> Result<DateTime<Utc>, ScheduleError> {
    match frequency {
        Frequency::None => Ok(anchor),
        Frequency::Daily => calendar.add_days(anchor, i64::from(n)),
        Frequency::Weekly => calendar.add_weeks(anchor, i64::from(n)),
        Frequency::Monthly => {
            let months = i32::try_from(n)
                .map_err(|_| ScheduleError::OutOfRange(format!("{n} months")))?;
            calendar.add_months(anchor, months)
        }
    }
}

fn materialize(
    definition: &AppointmentDefinition,
    index: usize,
    start: DateTime<Utc>,
) -> Occurrence {
    let duration = definition.end_time - definition.start_time;
    Occurrence {
        source_id: definition.id.clone(),
        occurrence_index: index,
        start_time: start,
        end_time: start + duration,
        title: definition.title.clone(),
        description: definition.description.clone(),
        recurrence_frequency: definition.frequency(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
