use intake_types::PatientField;

fn join_fields(fields: &[PatientField]) -> String {
    fields
        .iter()
        .map(|f| f.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: PatientField, reason: String },
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<PatientField>),
    #[error("a submission is already in progress")]
    Busy,
    #[error("failed to serialize patient: {0}")]
    Serialization(serde_json::Error),
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay rejected the submission (status {status}): {message}")]
    Relay { status: u16, message: String },
}

pub type FormResult<T> = std::result::Result<T, FormError>;

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("failed to create slot directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read slot file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write slot file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize roster: {0}")]
    Serialization(serde_json::Error),
}

pub type SlotResult<T> = std::result::Result<T, SlotError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
