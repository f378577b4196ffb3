//! Staff dashboard state.
//!
//! A [`Dashboard`] owns the roster and the persisted slot it mirrors into. It is driven by
//! [`run_dashboard`], which feeds it events from a channel subscription one at a time.
//!
//! ## Persistence
//!
//! After every roster change the entries whose status is `submitted` are written to the slot
//! as a complete JSON array. `filling` and `inactive` entries are never persisted, so an entry
//! that moves away from `submitted` disappears from the slot on the next write.

use crate::roster::{MergeOutcome, Roster, RosterCounts};
use crate::slot::SlotStore;
use crate::SlotError;
use intake_transport::{Subscription, TransportResult};
use intake_types::{PatientInput, RosterEntry};
use std::future::Future;

pub struct Dashboard<S: SlotStore> {
    roster: Roster,
    slot: S,
}

impl<S: SlotStore> Dashboard<S> {
    /// Creates a dashboard seeded from `slot`.
    ///
    /// An unreadable or unparsable slot is logged and the roster starts empty; the slot is
    /// left untouched until the first change.
    pub fn mount(slot: S) -> Self {
        let roster = match slot.load() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<RosterEntry>>(&raw) {
                Ok(entries) => {
                    tracing::info!("restored {} submitted patients", entries.len());
                    Roster::from_entries(entries)
                }
                Err(e) => {
                    tracing::warn!("Error loading saved patients: {}", e);
                    Roster::new()
                }
            },
            Ok(None) => Roster::new(),
            Err(e) => {
                tracing::warn!("Error loading saved patients: {}", e);
                Roster::new()
            }
        };

        Self { roster, slot }
    }

    /// Merges one received update and refreshes the persisted mirror.
    pub fn apply(&mut self, input: PatientInput) -> MergeOutcome {
        tracing::info!(
            "received patient update {} ({}) at {}",
            input.patient_data.id,
            input.status,
            input.timestamp.as_deref().unwrap_or("unknown time")
        );

        let outcome = self.roster.merge(RosterEntry {
            record: input.patient_data,
            status: input.status,
        });

        if let Err(e) = self.persist() {
            tracing::warn!("failed to persist submitted patients: {}", e);
        }
        outcome
    }

    /// Decodes and merges a raw event payload. Undecodable payloads are logged and dropped.
    pub fn apply_raw(&mut self, data: &str) -> Option<MergeOutcome> {
        match serde_json::from_str::<PatientInput>(data) {
            Ok(input) => Some(self.apply(input)),
            Err(e) => {
                tracing::warn!("dropping malformed patient update: {}", e);
                None
            }
        }
    }

    fn persist(&mut self) -> Result<(), SlotError> {
        let submitted = self.roster.persisted();
        let json = serde_json::to_string(&submitted).map_err(SlotError::Serialization)?;
        self.slot.save(&json)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn counts(&self) -> RosterCounts {
        self.roster.counts()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }
}

/// Feeds events from `subscription` into `dashboard` until `shutdown` resolves, the stream
/// ends, or the subscription fails.
///
/// Each event is merged to completion before the next is read. `on_change` runs after every
/// merged event. The subscription is closed on every exit path.
pub async fn run_dashboard<S, Sub, F>(
    mut subscription: Sub,
    dashboard: &mut Dashboard<S>,
    shutdown: F,
    mut on_change: impl FnMut(&Dashboard<S>),
) -> TransportResult<()>
where
    S: SlotStore,
    Sub: Subscription,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("dashboard shutting down");
                break Ok(());
            }
            next = subscription.next_event() => match next {
                Ok(Some(event)) => {
                    if dashboard.apply_raw(&event.data).is_some() {
                        on_change(dashboard);
                    }
                }
                Ok(None) => {
                    tracing::info!("subscription ended");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!("subscription error: {}", e);
                    break Err(e);
                }
            }
        }
    };

    if let Err(e) = subscription.close().await {
        tracing::warn!("failed to close subscription: {}", e);
    }
    result
}
