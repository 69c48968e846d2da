//! # booking-engine
//!
//! Appointment scheduling for a single user's calendar.
//!
//! Appointments are stored as *definitions*, possibly recurring. The schedule
//! a user sees (and books against) is always re-derived from those
//! definitions, so a new booking is checked against every future instance of
//! every series and not just the first.
//!
//! ## Modules
//!
//! - [`appointment`] — Definitions, drafts, occurrences, and their ids
//! - [`calendar`] — Local-calendar arithmetic (days, weeks, months) in an IANA zone
//! - [`expander`] — Definition → dated occurrences, with a horizon for open-ended series
//! - [`conflict`] — Half-open interval overlap detection
//! - [`validation`] — Field-tagged booking rule checks
//! - [`store`] — In-memory definitions with CRUD, booking, and materialized views
//! - [`config`] — Scheduler constants and runtime configuration
//! - [`clock`] — Injectable "now"
//! - [`error`] — Error types

pub mod appointment;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod store;
pub mod validation;

pub use appointment::{
    AppointmentDefinition, AppointmentDraft, AppointmentId, Frequency, Occurrence, OccurrenceId,
    Recurrence,
};
pub use calendar::{parse_instant, Calendar, WeekStartDay};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BookingPolicy, BusinessHours, SchedulerConfig};
pub use conflict::{find_conflicts, has_conflict, Interval, Timed};
pub use error::ScheduleError;
pub use expander::{expand, expand_all, ExpandOptions};
pub use store::{AppointmentStore, BookingCheck};
pub use validation::{validate_booking, ValidationError, ValidationField};
