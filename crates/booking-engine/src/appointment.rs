//! Appointment definitions and their materialized occurrences.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::Timed;
use crate::error::ScheduleError;

// ── Identity ────────────────────────────────────────────────────────────────

/// Opaque identifier of an [`AppointmentDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(String);

impl AppointmentId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppointmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AppointmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation identity of an [`Occurrence`]: `"<source id>-<index>"`.
///
/// Not a key for mutation. Resolve it to its [`AppointmentId`] first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccurrenceId {
    pub source_id: AppointmentId,
    pub index: usize,
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source_id, self.index)
    }
}

impl FromStr for OccurrenceId {
    type Err = ScheduleError;

    /// Split on the last `-`, so source ids may themselves contain hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, index) = s
            .trim()
            .rsplit_once('-')
            .ok_or_else(|| ScheduleError::InvalidOccurrenceId(format!("'{s}': missing index")))?;
        if source.is_empty() {
            return Err(ScheduleError::InvalidOccurrenceId(format!(
                "'{s}': missing source id"
            )));
        }
        let index = index
            .parse::<usize>()
            .map_err(|_| ScheduleError::InvalidOccurrenceId(format!("'{s}': bad index")))?;
        Ok(Self {
            source_id: AppointmentId::from(source),
            index,
        })
    }
}

// ── Recurrence ──────────────────────────────────────────────────────────────

/// How often a definition repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// A single occurrence. Unrecognized values read as this.
    #[default]
    #[serde(other)]
    None,
}

/// A repeat rule: cadence plus an optional inclusive last start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Recurrence {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            end_date: None,
        }
    }

    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

// ── Definitions ─────────────────────────────────────────────────────────────

/// The fields a caller supplies to create or replace an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl AppointmentDraft {
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            description: None,
            recurrence: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// A user-authored appointment, possibly recurring. The unit of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDefinition {
    pub id: AppointmentId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl AppointmentDefinition {
    pub fn from_draft(id: AppointmentId, draft: AppointmentDraft) -> Self {
        Self {
            id,
            title: draft.title,
            start_time: draft.start_time,
            end_time: draft.end_time,
            description: draft.description,
            recurrence: draft.recurrence,
        }
    }

    /// The effective cadence; a missing rule means [`Frequency::None`].
    pub fn frequency(&self) -> Frequency {
        self.recurrence.map(|r| r.frequency).unwrap_or_default()
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency() != Frequency::None
    }
}

// ── Occurrences ─────────────────────────────────────────────────────────────

/// One dated materialization of a definition. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub source_id: AppointmentId,
    pub occurrence_index: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub recurrence_frequency: Frequency,
}

impl Occurrence {
    pub fn id(&self) -> OccurrenceId {
        OccurrenceId {
            source_id: self.source_id.clone(),
            index: self.occurrence_index,
        }
    }
}

impl Timed for Occurrence {
    fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end(&self) -> DateTime<Utc> {
        self.end_time
    }
}
