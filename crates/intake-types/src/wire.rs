//! Request, response and channel payload shapes.

use crate::{PatientRecord, StatusTag};
use serde_json::Value;

/// Body of `POST /api/patient-update`.
///
/// Both members are raw JSON. The relay itself never decodes this type; it forwards the body
/// through [`RelayedEvent::from_body`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = PatientRecord)]
    pub patient_data: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    #[schema(value_type = StatusTag)]
    pub status: Value,
}

impl RelayRequest {
    pub fn from_record(record: &PatientRecord, status: StatusTag) -> serde_json::Result<Self> {
        Ok(Self {
            patient_data: serde_json::to_value(record)?,
            status: serde_json::to_value(status)?,
        })
    }
}

/// Payload published as `patient-input` on the `hospital-system` channel.
///
/// A member absent from the request body is absent here too; an explicit `null` is kept.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    pub timestamp: String,
}

impl RelayedEvent {
    /// Builds the event for a parsed request body, stamped with the relay's receive time.
    ///
    /// Members are only read from an object body; any other non-null body carries the
    /// timestamp alone. Returns `None` for a `null` body.
    pub fn from_body(body: Value, timestamp: String) -> Option<Self> {
        match body {
            Value::Null => None,
            Value::Object(mut members) => Some(Self {
                patient_data: members.remove("patientData"),
                status: members.remove("status"),
                timestamp,
            }),
            _ => Some(Self {
                patient_data: None,
                status: None,
                timestamp,
            }),
        }
    }
}

/// Typed view of a `patient-input` payload as consumed by the dashboard.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub patient_data: PatientRecord,
    pub status: StatusTag,
    /// Informational only; never used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Roster element, and the element type of the persisted slot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub record: PatientRecord,
    pub status: StatusTag,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
}

impl RelayResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: "Patient data sent successfully".into(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: "Failed to send data".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}
