//! # Intake Core
//!
//! Business logic for the patient intake system:
//! - [`form`]: the intake form draft and its submission to the relay
//! - [`roster`] and [`dashboard`]: reconciling channel events into the staff roster
//! - [`slot`]: the persisted mirror of submitted patients
//! - [`render`]: terminal output for the dashboard
//!
//! **No API concerns**: the HTTP relay lives in `api-rest`, and channel plumbing lives in
//! `intake-transport`.

pub mod client;
pub mod config;
pub mod constants;
pub mod dashboard;
mod error;
pub mod form;
pub mod render;
pub mod roster;
pub mod slot;

pub use client::RelayClient;
pub use config::{IntakeConfig, TransportMode};
pub use constants::*;
pub use dashboard::{run_dashboard, Dashboard};
pub use error::{ConfigError, ConfigResult, FormError, FormResult, SlotError, SlotResult};
pub use form::{IntakeForm, Submitter};
pub use roster::{MergeOutcome, Roster, RosterCounts};
pub use slot::{FileSlot, MemorySlot, SlotStore};

pub use intake_types::{
    Gender, PatientField, PatientId, PatientInput, PatientRecord, PreferredLanguage,
    RelayRequest, RelayResponse, RosterEntry, StatusTag,
};
