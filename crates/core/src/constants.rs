//! Constants used throughout the intake crates.
//!
//! Channel and event names form the wire contract with every other producer and consumer on
//! the hosted channel service and must not change.

/// Broadcast channel shared by the relay and all dashboards.
pub const CHANNEL_NAME: &str = "hospital-system";

/// Event name for patient record updates.
pub const PATIENT_INPUT_EVENT: &str = "patient-input";

/// Route of the relay endpoint.
pub const RELAY_PATH: &str = "/api/patient-update";

/// Name of the persisted slot holding submitted roster entries.
pub const SUBMITTED_SLOT: &str = "submittedPatients";

/// Default directory for dashboard persisted slots.
pub const DEFAULT_DATA_DIR: &str = "intake_data";

/// Default bind address of the relay server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default relay base URL used by the intake form.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000";
