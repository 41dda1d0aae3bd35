//! Discharge sync gateway and outbox drain.
//!
//! The downstream system that should eventually learn about discharges is an
//! external collaborator behind the [`DischargeSync`] trait. Delivery is
//! best-effort and strictly outside the discharge's unit of work: finalising
//! a discharge stages an [`OutboxEvent`] transactionally, and
//! [`drain_outbox`] later attempts delivery on its own schedule. A failed
//! delivery is logged and the event kept for retry; it never rolls back,
//! blocks, or reopens the committed discharge.

use crate::error::WardResult;
use crate::id::RecordId;
use crate::model::{DischargeNotice, OutboxEvent};
use crate::store::WardStore;
use chrono::Utc;

/// Failure surface of the downstream gateway. Never propagated to discharge
/// callers; visible only in operational logs and the drain report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("downstream discharge sync failed: {0}")]
    Delivery(String),
}

/// Outbound interface to the discharge sync system.
pub trait DischargeSync: Send + Sync {
    fn notify(&self, notice: &DischargeNotice) -> Result<(), SyncError>;
}

/// Default gateway for deployments without a configured downstream: records
/// the notice in the operational log and reports success.
#[derive(Clone, Debug, Default)]
pub struct LoggingDischargeSync;

impl DischargeSync for LoggingDischargeSync {
    fn notify(&self, notice: &DischargeNotice) -> Result<(), SyncError> {
        tracing::info!(
            admission_number = %notice.admission_number,
            discharge_type = %notice.discharge_type,
            "discharge notice (no downstream configured)"
        );
        Ok(())
    }
}

/// Outcome of one drain pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutboxDrainReport {
    pub delivered: usize,
    pub failed: usize,
    /// Events parked after exhausting their delivery attempts.
    pub exhausted: usize,
}

/// Attempt delivery of every pending outbox event.
///
/// Gateway calls happen outside any store transaction; only the bookkeeping
/// (delivered timestamp, attempt counter, last error) is written back. Events
/// that have used up `max_attempts` are left for manual review and counted as
/// exhausted.
pub fn drain_outbox(
    store: &WardStore,
    gateway: &dyn DischargeSync,
    max_attempts: u32,
) -> WardResult<OutboxDrainReport> {
    let pending: Vec<OutboxEvent> = store.read(|t| {
        t.outbox
            .values()
            .filter(|e| e.is_pending())
            .cloned()
            .collect()
    })?;

    let mut report = OutboxDrainReport::default();
    for event in pending {
        if event.attempts >= max_attempts {
            report.exhausted += 1;
            continue;
        }

        match gateway.notify(&event.notice) {
            Ok(()) => {
                mark_delivered(store, &event.id)?;
                report.delivered += 1;
            }
            Err(err) => {
                tracing::warn!(
                    admission = %event.admission_id,
                    attempts = event.attempts + 1,
                    error = %err,
                    "discharge sync delivery failed; will retry"
                );
                mark_failed(store, &event.id, &err)?;
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

fn mark_delivered(store: &WardStore, event_id: &RecordId) -> WardResult<()> {
    let event_id = *event_id;
    store.transaction(move |t| {
        if let Some(event) = t.outbox.get_mut(&event_id) {
            // A concurrent drain may have beaten us to it.
            if event.is_pending() {
                event.attempts += 1;
                event.delivered_at = Some(Utc::now());
                event.last_error = None;
            }
        }
        Ok(())
    })
}

fn mark_failed(store: &WardStore, event_id: &RecordId, err: &SyncError) -> WardResult<()> {
    let event_id = *event_id;
    let message = err.to_string();
    store.transaction(move |t| {
        if let Some(event) = t.outbox.get_mut(&event_id) {
            if event.is_pending() {
                event.attempts += 1;
                event.last_error = Some(message.clone());
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DischargeType;
    use std::sync::Mutex;

    struct RecordingSync {
        seen: Mutex<Vec<String>>,
    }

    impl DischargeSync for RecordingSync {
        fn notify(&self, notice: &DischargeNotice) -> Result<(), SyncError> {
            self.seen
                .lock()
                .unwrap()
                .push(notice.admission_number.clone());
            Ok(())
        }
    }

    struct FailingSync;

    impl DischargeSync for FailingSync {
        fn notify(&self, _notice: &DischargeNotice) -> Result<(), SyncError> {
            Err(SyncError::Delivery("connection refused".into()))
        }
    }

    fn stage_event(store: &WardStore, admission_number: &str, attempts: u32) -> RecordId {
        let event = OutboxEvent {
            id: RecordId::new(),
            admission_id: RecordId::new(),
            notice: DischargeNotice {
                patient_id: RecordId::new(),
                admission_number: admission_number.to_string(),
                discharge_datetime: Utc::now(),
                diagnosis: "pneumonia".into(),
                discharge_type: DischargeType::Routine,
                condition_on_discharge: Some("stable".into()),
                follow_up_instructions: None,
            },
            created_at: Utc::now(),
            attempts,
            delivered_at: None,
            last_error: None,
        };
        let id = event.id;
        store
            .transaction(move |t| {
                t.outbox.insert(event.id, event.clone());
                Ok(())
            })
            .unwrap();
        id
    }

    #[test]
    fn drain_delivers_and_marks_pending_events() {
        let store = WardStore::in_memory();
        let id = stage_event(&store, "ADM-2026-000007", 0);
        let gateway = RecordingSync {
            seen: Mutex::new(Vec::new()),
        };

        let report = drain_outbox(&store, &gateway, 5).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(
            gateway.seen.lock().unwrap().as_slice(),
            ["ADM-2026-000007".to_string()]
        );

        let event = store.read(|t| t.outbox.get(&id).cloned()).unwrap().unwrap();
        assert!(!event.is_pending());
        assert_eq!(event.attempts, 1);
    }

    #[test]
    fn failed_delivery_keeps_the_event_and_records_the_error() {
        let store = WardStore::in_memory();
        let id = stage_event(&store, "ADM-2026-000008", 0);

        let report = drain_outbox(&store, &FailingSync, 5).unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, 1);

        let event = store.read(|t| t.outbox.get(&id).cloned()).unwrap().unwrap();
        assert!(event.is_pending());
        assert_eq!(event.attempts, 1);
        assert!(event
            .last_error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
    }

    #[test]
    fn exhausted_events_are_parked_not_retried() {
        let store = WardStore::in_memory();
        stage_event(&store, "ADM-2026-000009", 5);

        let report = drain_outbox(&store, &FailingSync, 5).unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(report.exhausted, 1);
    }

    #[test]
    fn delivered_events_are_not_redelivered() {
        let store = WardStore::in_memory();
        stage_event(&store, "ADM-2026-000010", 0);
        let gateway = RecordingSync {
            seen: Mutex::new(Vec::new()),
        };

        drain_outbox(&store, &gateway, 5).unwrap();
        let report = drain_outbox(&store, &gateway, 5).unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(gateway.seen.lock().unwrap().len(), 1);
    }
}
