//! Patient intake form.
//!
//! The form holds a mutable draft of one [`PatientRecord`]. The draft receives a fresh
//! identity when the form is created and every time it is reset, so each patient who fills in
//! the form is a distinct roster entry on the dashboards.
//!
//! Submission only resets the draft once the relay has accepted it. On failure the draft is
//! kept and the error is returned so the caller can retry; nothing is retried automatically.

use crate::{FormError, FormResult};
use async_trait::async_trait;
use intake_types::{
    Gender, PatientField, PatientId, PatientRecord, PreferredLanguage, RelayRequest,
    RelayResponse, StatusTag,
};

/// Delivers a relay request, typically over HTTP to the relay endpoint.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> FormResult<RelayResponse>;
}

#[derive(Debug)]
pub struct IntakeForm {
    draft: PatientRecord,
    busy: bool,
}

impl Default for IntakeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeForm {
    pub fn new() -> Self {
        Self {
            draft: PatientRecord::empty(PatientId::generate()),
            busy: false,
        }
    }

    pub fn draft(&self) -> &PatientRecord {
        &self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Sets the field named `field` (wire or snake_case name) to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for an unrecognised name and
    /// [`FormError::InvalidValue`] for a gender outside the offered options.
    pub fn handle_change(&mut self, field: &str, value: &str) -> FormResult<()> {
        let field = field
            .parse::<PatientField>()
            .map_err(|_| FormError::UnknownField(field.to_string()))?;
        self.set(field, value)
    }

    /// Sets exactly one field, leaving the rest of the draft untouched.
    pub fn set(&mut self, field: PatientField, value: &str) -> FormResult<()> {
        let d = &mut self.draft;
        match field {
            PatientField::FirstName => d.first_name = value.to_string(),
            PatientField::LastName => d.last_name = value.to_string(),
            PatientField::DateOfBirth => d.date_of_birth = value.to_string(),
            PatientField::Gender => {
                d.gender = if value.trim().is_empty() {
                    String::new()
                } else {
                    value
                        .parse::<Gender>()
                        .map_err(|reason| FormError::InvalidValue { field, reason })?
                        .as_str()
                        .to_string()
                }
            }
            PatientField::Phone => d.phone = value.to_string(),
            PatientField::Email => d.email = value.to_string(),
            PatientField::Address => d.address = value.to_string(),
            PatientField::EmergencyContact => d.emergency_contact = value.to_string(),
            PatientField::PreferredLanguage => {
                d.preferred_language = match value.parse::<PreferredLanguage>() {
                    Ok(lang) if !value.trim().is_empty() => lang.as_str().to_string(),
                    _ => String::new(),
                }
            }
            PatientField::Nationality => d.nationality = value.to_string(),
            PatientField::Religion => d.religion = value.to_string(),
        }
        Ok(())
    }

    pub fn missing_required(&self) -> Vec<PatientField> {
        self.draft.missing_required()
    }

    /// Replaces the draft with an all-empty record under a new identity.
    pub fn reset(&mut self) {
        self.draft = PatientRecord::empty(PatientId::generate());
    }

    /// Enters the busy state and builds the request for `status`.
    ///
    /// A `submitted` request requires every mandatory field to be filled in.
    pub fn begin_submit(&mut self, status: StatusTag) -> FormResult<RelayRequest> {
        if self.busy {
            return Err(FormError::Busy);
        }
        if status == StatusTag::Submitted {
            let missing = self.missing_required();
            if !missing.is_empty() {
                return Err(FormError::MissingFields(missing));
            }
        }
        let request =
            RelayRequest::from_record(&self.draft, status).map_err(FormError::Serialization)?;
        self.busy = true;
        Ok(request)
    }

    /// Leaves the busy state; the draft is reset only if the relay accepted it and `reset` is
    /// set.
    pub fn finish_submit(&mut self, outcome: &FormResult<RelayResponse>, reset: bool) {
        self.busy = false;
        match outcome {
            Ok(_) if reset => self.reset(),
            Ok(_) => {}
            Err(e) => tracing::warn!("submission of {} failed, draft kept: {}", self.draft.id, e),
        }
    }

    async fn send(
        &mut self,
        submitter: &dyn Submitter,
        status: StatusTag,
        reset: bool,
    ) -> FormResult<RelayResponse> {
        let request = self.begin_submit(status)?;
        let outcome = {
            let _busy = BusyGuard(&mut self.busy);
            submitter.send(&request).await
        };
        self.finish_submit(&outcome, reset);
        if outcome.is_ok() {
            tracing::info!("relayed {} as {}", request_id(&request), status);
        }
        outcome
    }

    /// Submits the completed draft and resets the form.
    pub async fn submit(&mut self, submitter: &dyn Submitter) -> FormResult<RelayResponse> {
        self.send(submitter, StatusTag::Submitted, true).await
    }

    /// Publishes the in-progress draft as `filling`. The draft is kept.
    pub async fn report_progress(&mut self, submitter: &dyn Submitter) -> FormResult<RelayResponse> {
        self.send(submitter, StatusTag::Filling, false).await
    }

    /// Publishes the draft as `inactive` and starts a new one.
    pub async fn abandon(&mut self, submitter: &dyn Submitter) -> FormResult<RelayResponse> {
        self.send(submitter, StatusTag::Inactive, true).await
    }
}

/// Clears the busy flag even if the in-flight send is cancelled.
struct BusyGuard<'a>(&'a mut bool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn request_id(request: &RelayRequest) -> &str {
    request
        .patient_data
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        sent: Mutex<Vec<RelayRequest>>,
    }

    #[async_trait]
    impl Submitter for RecordingSubmitter {
        async fn send(&self, request: &RelayRequest) -> FormResult<RelayResponse> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(RelayResponse::sent())
        }
    }

    struct FailingSubmitter;

    #[async_trait]
    impl Submitter for FailingSubmitter {
        async fn send(&self, _request: &RelayRequest) -> FormResult<RelayResponse> {
            Err(FormError::Relay {
                status: 500,
                message: "Failed to send data".into(),
            })
        }
    }

    struct StalledSubmitter;

    #[async_trait]
    impl Submitter for StalledSubmitter {
        async fn send(&self, _request: &RelayRequest) -> FormResult<RelayResponse> {
            std::future::pending().await
        }
    }

    fn filled_form() -> IntakeForm {
        let mut form = IntakeForm::new();
        for (field, value) in [
            ("firstName", "Ann"),
            ("lastName", "Lee"),
            ("dateOfBirth", "1990-04-01"),
            ("gender", "female"),
            ("phone", "555 0100"),
            ("email", "ann@example.com"),
            ("address", "1 Main St"),
            ("emergencyContact", "Bob 555 0101"),
            ("preferredLanguage", "english"),
            ("nationality", "Canadian"),
        ] {
            form.handle_change(field, value).unwrap();
        }
        form
    }

    #[test]
    fn handle_change_sets_only_the_named_field() {
        let mut form = filled_form();
        let before = form.draft().clone();

        form.handle_change("nationality", "Irish").unwrap();

        let after = form.draft();
        assert_eq!(after.nationality, "Irish");
        assert_eq!(
            PatientRecord {
                nationality: before.nationality.clone(),
                ..after.clone()
            },
            before
        );
    }

    #[test]
    fn handle_change_rejects_unknown_fields_and_bad_gender() {
        let mut form = IntakeForm::new();
        assert!(matches!(
            form.handle_change("bloodType", "O"),
            Err(FormError::UnknownField(_))
        ));
        assert!(matches!(
            form.handle_change("gender", "robot"),
            Err(FormError::InvalidValue {
                field: PatientField::Gender,
                ..
            })
        ));
        form.handle_change("gender", "male").unwrap();
        form.handle_change("gender", "").unwrap();
        assert_eq!(form.draft().gender, "");
    }

    #[tokio::test]
    async fn submit_sends_submitted_and_resets_with_new_identity() {
        let submitter = RecordingSubmitter::default();
        let mut form = filled_form();
        let id = form.draft().id.clone();

        let response = form.submit(&submitter).await.unwrap();
        assert!(response.success);
        assert!(!form.is_busy());
        assert_ne!(form.draft().id, id);
        assert!(form.draft().first_name.is_empty());

        let sent = submitter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].status, "submitted");
        assert_eq!(sent[0].patient_data["id"], id.as_str());
        assert_eq!(sent[0].patient_data["firstName"], "Ann");
    }

    #[tokio::test]
    async fn incomplete_draft_is_not_submitted() {
        let submitter = RecordingSubmitter::default();
        let mut form = filled_form();
        form.handle_change("email", "").unwrap();

        let result = form.submit(&submitter).await;
        assert!(matches!(result, Err(FormError::MissingFields(ref f)) if f == &[PatientField::Email]));
        assert!(submitter.sent.lock().unwrap().is_empty());
        assert!(!form.is_busy());
    }

    #[tokio::test]
    async fn religion_is_optional() {
        let submitter = RecordingSubmitter::default();
        let mut form = filled_form();
        assert!(form.draft().religion.is_empty());
        form.submit(&submitter).await.unwrap();
    }

    #[tokio::test]
    async fn failed_submission_keeps_draft_and_clears_busy() {
        let mut form = filled_form();
        let before = form.draft().clone();

        let result = form.submit(&FailingSubmitter).await;
        assert!(matches!(result, Err(FormError::Relay { status: 500, .. })));
        assert!(!form.is_busy());
        assert_eq!(form.draft(), &before);
    }

    #[tokio::test]
    async fn cancelled_submission_clears_busy() {
        let mut form = filled_form();
        let before = form.draft().clone();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            form.submit(&StalledSubmitter),
        )
        .await;
        assert!(result.is_err());
        assert!(!form.is_busy());
        assert_eq!(form.draft(), &before);

        let submitter = RecordingSubmitter::default();
        form.submit(&submitter).await.unwrap();
        assert_eq!(submitter.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn progress_report_keeps_draft() {
        let submitter = RecordingSubmitter::default();
        let mut form = IntakeForm::new();
        form.handle_change("firstName", "Jo").unwrap();
        let id = form.draft().id.clone();

        form.report_progress(&submitter).await.unwrap();
        assert_eq!(form.draft().id, id);
        assert_eq!(form.draft().first_name, "Jo");
        assert_eq!(submitter.sent.lock().unwrap()[0].status, "filling");
    }

    #[tokio::test]
    async fn abandon_sends_inactive_and_resets() {
        let submitter = RecordingSubmitter::default();
        let mut form = IntakeForm::new();
        let id = form.draft().id.clone();

        form.abandon(&submitter).await.unwrap();
        assert_ne!(form.draft().id, id);
        assert_eq!(submitter.sent.lock().unwrap()[0].status, "inactive");
    }

    #[test]
    fn begin_submit_twice_is_busy() {
        let mut form = filled_form();
        form.begin_submit(StatusTag::Submitted).unwrap();
        assert!(form.is_busy());
        assert!(matches!(
            form.begin_submit(StatusTag::Submitted),
            Err(FormError::Busy)
        ));
        form.finish_submit(&Ok(RelayResponse::sent()), true);
        assert!(!form.is_busy());
    }
}
