//! # Intake Types
//!
//! Data and wire types shared by the relay, the intake form and the dashboard.
//!
//! Field names on the wire are camelCase so that records published by the relay stay
//! interchangeable with any other producer on the `hospital-system` channel.

mod id;
mod patient;
mod status;
mod wire;

pub use id::{IdError, PatientId};
pub use patient::{Gender, PatientField, PatientRecord, PreferredLanguage};
pub use status::StatusTag;
pub use wire::{HealthRes, PatientInput, RelayRequest, RelayResponse, RelayedEvent, RosterEntry};
