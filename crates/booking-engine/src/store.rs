//! In-memory appointment store.
//!
//! Holds appointment *definitions* only. Every read of the materialized
//! schedule re-runs the expander over the current definitions with the
//! current clock, so nothing derived is ever cached or stale.
//!
//! Mutations take `&mut self`; callers that share a store across threads put
//! it behind their own lock.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::appointment::{
    AppointmentDefinition, AppointmentDraft, AppointmentId, Occurrence, OccurrenceId,
};
use crate::calendar::Calendar;
use crate::clock::{Clock, SystemClock};
use crate::config::{BookingPolicy, SchedulerConfig};
use crate::conflict::{find_conflicts, Interval};
use crate::error::{Result, ScheduleError};
use crate::expander::{count_occurrences, expand_all, ExpandOptions};
use crate::validation::{validate_booking, ValidationError};

/// Outcome of [`AppointmentStore::check_booking`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCheck {
    /// Every violated rule, in report order.
    pub errors: Vec<ValidationError>,
    /// Existing occurrences the proposed interval overlaps, in schedule order.
    pub conflicts: Vec<Occurrence>,
}

impl BookingCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A session's appointment definitions plus the rules to expand and book them.
#[derive(Debug)]
pub struct AppointmentStore<C: Clock = SystemClock> {
    definitions: Vec<AppointmentDefinition>,
    config: SchedulerConfig,
    options: ExpandOptions,
    policy: BookingPolicy,
    clock: C,
}

impl AppointmentStore<SystemClock> {
    /// An empty store reading the system clock.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AppointmentStore<C> {
    /// An empty store reading `clock` for every "now".
    ///
    /// # Errors
    ///
    /// Returns the configuration error if `config` fails validation.
    pub fn with_clock(config: SchedulerConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let options = ExpandOptions::from_config(&config)?;
        let policy = config.booking_policy();
        Ok(Self {
            definitions: Vec::new(),
            config,
            options,
            policy,
            clock,
        })
    }

    /// Seed the store with existing definitions, keeping their ids.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::DuplicateId`] if an id repeats (within `definitions`
    /// or against the store), [`ScheduleError::TooManyOccurrences`] if a
    /// definition exceeds the occurrence cap. The store is unchanged on error.
    pub fn with_definitions<I>(mut self, definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = AppointmentDefinition>,
    {
        let seeded = self.definitions.len();
        for definition in definitions {
            if self.position(&definition.id).is_some() {
                self.definitions.truncate(seeded);
                return Err(ScheduleError::DuplicateId(definition.id.to_string()));
            }
            if let Err(e) = self.check_occurrence_cap(&definition) {
                self.definitions.truncate(seeded);
                return Err(e);
            }
            self.definitions.push(definition);
        }
        info!(count = self.definitions.len() - seeded, "seeded appointment store");
        Ok(self)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.options.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── CRUD ────────────────────────────────────────────────────────────────

    /// Store a new definition and return its freshly assigned id.
    ///
    /// Does not validate booking rules; see [`AppointmentStore::book`].
    pub fn create(&mut self, draft: AppointmentDraft) -> Result<AppointmentId> {
        let id = AppointmentId::generate();
        let definition = AppointmentDefinition::from_draft(id.clone(), draft);
        self.check_occurrence_cap(&definition)?;
        info!(id = %id, title = %definition.title, "created appointment");
        self.definitions.push(definition);
        Ok(id)
    }

    /// Replace every field of an existing definition except its id.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::NotFound`] if `id` is not in the store; nothing is
    /// created or changed in that case.
    pub fn update(&mut self, id: &AppointmentId, draft: AppointmentDraft) -> Result<()> {
        let index = self
            .position(id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
        let definition = AppointmentDefinition::from_draft(id.clone(), draft);
        self.check_occurrence_cap(&definition)?;
        info!(id = %id, title = %definition.title, "updated appointment");
        self.definitions[index] = definition;
        Ok(())
    }

    /// Remove a definition (the whole series) and return it.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::NotFound`] if `id` is not in the store. Callers that
    /// treat "already gone" as success can ignore that variant.
    pub fn delete(&mut self, id: &AppointmentId) -> Result<AppointmentDefinition> {
        let index = self
            .position(id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
        let removed = self.definitions.remove(index);
        info!(id = %id, title = %removed.title, "deleted appointment");
        Ok(removed)
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&AppointmentDefinition> {
        self.definitions.iter().find(|d| &d.id == id)
    }

    /// All definitions, in insertion order.
    pub fn list(&self) -> &[AppointmentDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    // ── Materialized reads ──────────────────────────────────────────────────

    /// Every occurrence of every definition, grouped by definition.
    pub fn expand_all(&self) -> Vec<Occurrence> {
        expand_all(&self.definitions, self.clock.now(), &self.options)
    }

    /// Occurrences overlapping `[from, to)`, sorted by start. Either bound may
    /// be left open.
    pub fn occurrences_between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<Occurrence> {
        let mut found: Vec<Occurrence> = self
            .expand_all()
            .into_iter()
            .filter(|o| from.map_or(true, |f| o.end_time > f))
            .filter(|o| to.map_or(true, |t| o.start_time < t))
            .collect();
        sort_by_start(&mut found);
        found
    }

    /// Occurrences starting on the same local day as `day`, sorted by start.
    pub fn occurrences_on(&self, day: DateTime<Utc>) -> Vec<Occurrence> {
        let calendar = self.options.calendar;
        let mut found: Vec<Occurrence> = self
            .expand_all()
            .into_iter()
            .filter(|o| calendar.is_same_day(o.start_time, day))
            .collect();
        sort_by_start(&mut found);
        found
    }

    /// The next `limit` occurrences starting today or later, sorted by start.
    pub fn upcoming(&self, limit: usize) -> Result<Vec<Occurrence>> {
        let today = self.options.calendar.start_of_day(self.clock.now())?;
        let mut found: Vec<Occurrence> = self
            .expand_all()
            .into_iter()
            .filter(|o| o.start_time >= today)
            .collect();
        sort_by_start(&mut found);
        found.truncate(limit);
        Ok(found)
    }

    /// Map a presentation occurrence id (`"<id>-<index>"`) to the definition
    /// that owns it.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidOccurrenceId`] for a malformed id,
    /// [`ScheduleError::NotFound`] if the owning definition is gone.
    pub fn resolve_source_id(&self, occurrence_id: &str) -> Result<AppointmentId> {
        let parsed: OccurrenceId = occurrence_id.parse()?;
        match self.get(&parsed.source_id) {
            Some(definition) => Ok(definition.id.clone()),
            None => Err(ScheduleError::NotFound(parsed.source_id.to_string())),
        }
    }

    // ── Booking ─────────────────────────────────────────────────────────────

    /// Validate a new booking against the current schedule.
    pub fn validate(
        &self,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Vec<ValidationError> {
        self.check_booking(title, start_time, end_time).errors
    }

    /// Validate a new booking and collect the occurrences it overlaps.
    ///
    /// The clock is read once and the schedule expanded once, so the errors
    /// and the conflicts always describe the same schedule.
    pub fn check_booking(
        &self,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BookingCheck {
        let now = self.clock.now();
        let existing = expand_all(&self.definitions, now, &self.options);
        let errors = validate_booking(title, start_time, end_time, &existing, now, &self.policy);
        let conflicts = find_conflicts(&Interval::new(start_time, end_time), &existing)
            .into_iter()
            .cloned()
            .collect();
        BookingCheck { errors, conflicts }
    }

    /// Validate an edit of `id`, ignoring the series being replaced so it
    /// cannot conflict with itself.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::NotFound`] if `id` is not in the store.
    pub fn validate_update(
        &self,
        id: &AppointmentId,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<ValidationError>> {
        if self.position(id).is_none() {
            return Err(ScheduleError::NotFound(id.to_string()));
        }
        let now = self.clock.now();
        let others: Vec<Occurrence> = expand_all(&self.definitions, now, &self.options)
            .into_iter()
            .filter(|o| &o.source_id != id)
            .collect();
        Ok(validate_booking(title, start_time, end_time, &others, now, &self.policy))
    }

    /// Validate, then create.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::Rejected`] carrying every violated rule, or any
    /// error from [`AppointmentStore::create`].
    pub fn book(&mut self, draft: AppointmentDraft) -> Result<AppointmentId> {
        let errors = self.validate(&draft.title, draft.start_time, draft.end_time);
        if !errors.is_empty() {
            debug!(title = %draft.title, rules = errors.len(), "booking rejected");
            return Err(ScheduleError::Rejected(errors));
        }
        self.create(draft)
    }

    /// Validate an edit of the whole series `id`, then apply it.
    pub fn reschedule(&mut self, id: &AppointmentId, draft: AppointmentDraft) -> Result<()> {
        let errors = self.validate_update(id, &draft.title, draft.start_time, draft.end_time)?;
        if !errors.is_empty() {
            debug!(id = %id, rules = errors.len(), "reschedule rejected");
            return Err(ScheduleError::Rejected(errors));
        }
        self.update(id, draft)
    }

    // ── Internal helpers ────────────────────────────────────────────────────

    fn position(&self, id: &AppointmentId) -> Option<usize> {
        self.definitions.iter().position(|d| &d.id == id)
    }

    fn check_occurrence_cap(&self, definition: &AppointmentDefinition) -> Result<()> {
        let limit = self.config.max_occurrences;
        let count = count_occurrences(definition, self.clock.now(), &self.options, limit)?;
        if count > limit {
            return Err(ScheduleError::TooManyOccurrences { count, limit });
        }
        Ok(())
    }
}

fn sort_by_start(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
}
