//! Admission service: join requests, code confirmation, and promotion.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::{
    AdmissionEvent, Clock, Event, EventBus, EventId, EventSummary, NewEvent, NewParticipant,
    ParticipantRequest, RejectionReason, RequestId, RequestState, Role,
};
use crate::error::GatewayError;
use crate::notify::{NotificationDispatcher, VerificationMessage};
use crate::store::{AdmissionStore, Promotion};

/// Orchestration layer for every admission operation.
///
/// Stateless coordinator: owns the [`AdmissionStore`] for records, the
/// [`EventBus`] for domain events, the [`NotificationDispatcher`] for
/// verification emails, and a [`Clock`] for expiry decisions. Mutations
/// follow the pattern: validate → store → emit events → return record.
#[derive(Debug, Clone)]
pub struct AdmissionService {
    store: Arc<dyn AdmissionStore>,
    event_bus: EventBus,
    notifications: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    request_ttl: Duration,
}

impl AdmissionService {
    /// Creates a new `AdmissionService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        event_bus: EventBus,
        notifications: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        request_ttl: Duration,
    ) -> Self {
        Self {
            store,
            event_bus,
            notifications,
            clock,
            request_ttl,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AdmissionStore> {
        &self.store
    }

    /// Creates a new event.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the store fails.
    pub async fn create_event(&self, input: NewEvent) -> Result<Event, GatewayError> {
        let event = Event::new(input.name, input.max_participants, self.clock.now());
        let event = self.store.insert_event(event).await?;

        let _ = self.event_bus.publish(AdmissionEvent::EventCreated {
            event_id: event.id,
            name: event.name.clone(),
            max_participants: event.max_participants,
            timestamp: event.created_at,
        });

        tracing::info!(event_id = %event.id, max_participants = event.max_participants, "event created");
        Ok(event)
    }

    /// Returns an event with freshly computed occupancy for both roles.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn get_event(&self, event_id: EventId) -> Result<EventSummary, GatewayError> {
        let event = self.load_event(event_id).await?;
        self.summarize(event).await
    }

    /// Returns every event with its occupancy, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the store fails.
    pub async fn list_events(&self) -> Result<Vec<EventSummary>, GatewayError> {
        let events = self.store.list_events().await?;
        let mut summaries = Vec::with_capacity(events.len());
        for event in events {
            summaries.push(self.summarize(event).await?);
        }
        Ok(summaries)
    }

    /// Deletes an event together with all of its requests.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn delete_event(&self, event_id: EventId) -> Result<(), GatewayError> {
        if !self.store.delete_event(event_id).await? {
            return Err(GatewayError::EventNotFound(*event_id.as_uuid()));
        }

        let _ = self.event_bus.publish(AdmissionEvent::EventDeleted {
            event_id,
            timestamp: self.clock.now(),
        });

        tracing::info!(%event_id, "event deleted");
        Ok(())
    }

    /// Sums party sizes of the event's requests in `role`.
    ///
    /// Always read fresh from the store; `0` when the role is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn occupancy(&self, event_id: EventId, role: Role) -> Result<u64, GatewayError> {
        self.load_event(event_id).await?;
        self.store.occupancy(event_id, role).await
    }

    /// Puts a requester on the event's waiting list and mails them a code.
    ///
    /// Never checks capacity. The email is queued best-effort: a full
    /// queue or a failing notifier does not fail the request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn request_join(
        &self,
        event_id: EventId,
        input: NewParticipant,
    ) -> Result<ParticipantRequest, GatewayError> {
        let event = self.load_event(event_id).await?;
        let now = self.clock.now();
        let request = ParticipantRequest::new(event.id, input, now, self.request_ttl)?;
        let request = self.store.insert_request(request).await?;

        self.notifications.dispatch(VerificationMessage {
            to: request.email.clone(),
            request_id: request.id,
            event_id: event.id,
            code: request.code.as_str().to_string(),
            name: request.name.clone(),
            party_size: request.party_size,
            event_name: event.name,
        });

        let _ = self.event_bus.publish(AdmissionEvent::JoinRequested {
            event_id,
            request_id: request.id,
            party_size: request.party_size,
            expiration: request.expiration,
            timestamp: now,
        });

        tracing::info!(
            %event_id,
            request_id = %request.id,
            party_size = request.party_size,
            "join requested"
        );
        Ok(request)
    }

    /// Confirms a waiting request with its verification code.
    ///
    /// Checks run in a fixed order: existence, code, prior confirmation,
    /// expiry, then capacity. The capacity check and the promotion happen
    /// atomically per event inside the store.
    ///
    /// Re-confirming an already confirmed request with the right code
    /// returns it unchanged.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::RequestNotFound`] if the id does not resolve.
    /// - [`GatewayError::IncorrectCode`] if the code differs; retryable.
    /// - [`GatewayError::RequestExpired`] once the window has passed; the
    ///   request becomes terminally expired.
    /// - [`GatewayError::EventFull`] if the party does not fit; retryable.
    pub async fn confirm(
        &self,
        request_id: RequestId,
        submitted_code: &str,
    ) -> Result<ParticipantRequest, GatewayError> {
        let now = self.clock.now();
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or(GatewayError::RequestNotFound(*request_id.as_uuid()))?;

        if !request.code.matches(submitted_code) {
            self.publish_rejection(&request, RejectionReason::IncorrectCode);
            tracing::debug!(%request_id, "confirmation rejected: incorrect code");
            return Err(GatewayError::IncorrectCode);
        }

        match request.state {
            RequestState::Confirmed => return Ok(request),
            RequestState::Expired => return Err(GatewayError::RequestExpired),
            RequestState::Waiting => {}
        }

        if request.is_overdue(now) {
            if let Some(expired) = self.store.mark_expired(request_id).await? {
                self.publish_expired(&expired);
            }
            tracing::debug!(%request_id, "confirmation rejected: request expired");
            return Err(GatewayError::RequestExpired);
        }

        match self.store.try_promote(request_id, now).await? {
            Promotion::Promoted {
                request,
                confirmed_total,
            } => {
                let _ = self.event_bus.publish(AdmissionEvent::RequestConfirmed {
                    event_id: request.event_id,
                    request_id,
                    party_size: request.party_size,
                    confirmed_total,
                    timestamp: now,
                });
                tracing::info!(
                    event_id = %request.event_id,
                    %request_id,
                    party_size = request.party_size,
                    confirmed_total,
                    "request confirmed"
                );
                Ok(request)
            }
            Promotion::AlreadyConfirmed(request) => Ok(request),
            Promotion::Expired {
                request,
                newly_expired,
            } => {
                if newly_expired {
                    self.publish_expired(&request);
                }
                tracing::debug!(%request_id, "confirmation rejected: request expired");
                Err(GatewayError::RequestExpired)
            }
            Promotion::Full {
                request,
                confirmed_total,
            } => {
                self.publish_rejection(&request, RejectionReason::EventFull);
                tracing::debug!(
                    %request_id,
                    confirmed_total,
                    party_size = request.party_size,
                    "confirmation rejected: event full"
                );
                Err(GatewayError::EventFull)
            }
        }
    }

    /// Loads a single request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestNotFound`] if the id does not resolve.
    pub async fn get_participant(
        &self,
        request_id: RequestId,
    ) -> Result<ParticipantRequest, GatewayError> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or(GatewayError::RequestNotFound(*request_id.as_uuid()))
    }

    /// Lists the event's requests in one role, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event does not exist.
    pub async fn list_participants(
        &self,
        event_id: EventId,
        role: Role,
    ) -> Result<Vec<ParticipantRequest>, GatewayError> {
        self.load_event(event_id).await?;
        self.store.list_requests(event_id, role).await
    }

    /// Marks every overdue waiting request as expired.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the store fails.
    pub async fn expire_overdue(&self) -> Result<Vec<RequestId>, GatewayError> {
        let expired = self.store.expire_overdue(self.clock.now()).await?;
        for request in &expired {
            self.publish_expired(request);
        }
        Ok(expired.into_iter().map(|request| request.id).collect())
    }

    async fn load_event(&self, event_id: EventId) -> Result<Event, GatewayError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(GatewayError::EventNotFound(*event_id.as_uuid()))
    }

    async fn summarize(&self, event: Event) -> Result<EventSummary, GatewayError> {
        let participants_count = self.store.occupancy(event.id, Role::Confirmed).await?;
        let waiting_participants_count = self.store.occupancy(event.id, Role::Waiting).await?;
        Ok(EventSummary {
            event,
            participants_count,
            waiting_participants_count,
        })
    }

    fn publish_rejection(&self, request: &ParticipantRequest, reason: RejectionReason) {
        let _ = self.event_bus.publish(AdmissionEvent::ConfirmationRejected {
            event_id: request.event_id,
            request_id: request.id,
            reason,
            timestamp: self.clock.now(),
        });
    }

    fn publish_expired(&self, request: &ParticipantRequest) {
        let _ = self.event_bus.publish(AdmissionEvent::RequestExpired {
            event_id: request.event_id,
            request_id: request.id,
            timestamp: self.clock.now(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use crate::notify::{Notifier, RecordingNotifier};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use futures_util::future::join_all;
    use proptest::prelude::*;

    struct Harness {
        service: AdmissionService,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let notifier = Arc::new(notifier);
        let (notifications, _worker) =
            NotificationDispatcher::spawn(Arc::clone(&notifier) as Arc<dyn Notifier>, 64);
        let service = AdmissionService::new(
            Arc::new(MemoryStore::new()),
            EventBus::new(1000),
            notifications,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::minutes(5),
        );
        Harness {
            service,
            clock,
            notifier,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::new())
    }

    fn guest(party_size: u32) -> NewParticipant {
        let Ok(input) =
            NewParticipant::parse("Margaret", "margaret@example.com", i64::from(party_size))
        else {
            panic!("invalid party size {party_size}");
        };
        input
    }

    async fn event(service: &AdmissionService, max: u32) -> EventId {
        let input = NewEvent {
            name: "Moon landing party".to_string(),
            max_participants: max,
        };
        let Ok(event) = service.create_event(input).await else {
            panic!("event creation failed");
        };
        event.id
    }

    async fn join(service: &AdmissionService, event_id: EventId, size: u32) -> ParticipantRequest {
        let Ok(req) = service.request_join(event_id, guest(size)).await else {
            panic!("join failed");
        };
        req
    }

    async fn wait_for_sent(notifier: &RecordingNotifier, count: usize) -> Vec<VerificationMessage> {
        for _ in 0..200 {
            let sent = notifier.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        notifier.sent().await
    }

    #[tokio::test]
    async fn scenario_second_party_does_not_fit() {
        let h = harness();
        let event_id = event(&h.service, 10).await;

        let first = join(&h.service, event_id, 6).await;
        let second = join(&h.service, event_id, 6).await;

        let Ok(confirmed) = h.service.confirm(first.id, first.code.as_str()).await else {
            panic!("first confirmation failed");
        };
        assert_eq!(confirmed.state, RequestState::Confirmed);
        assert_eq!(h.service.occupancy(event_id, Role::Confirmed).await.ok(), Some(6));

        let result = h.service.confirm(second.id, second.code.as_str()).await;
        assert!(matches!(result, Err(GatewayError::EventFull)));
        assert_eq!(h.service.occupancy(event_id, Role::Confirmed).await.ok(), Some(6));

        let Ok(still_waiting) = h.service.get_participant(second.id).await else {
            panic!("second request vanished");
        };
        assert_eq!(still_waiting.state, RequestState::Waiting);
    }

    #[tokio::test]
    async fn confirm_unknown_request_is_not_found_and_mutates_nothing() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 2).await;

        let result = h.service.confirm(RequestId::new(), "1234").await;
        assert!(matches!(result, Err(GatewayError::RequestNotFound(_))));

        let Ok(summary) = h.service.get_event(event_id).await else {
            panic!("event vanished");
        };
        assert_eq!(summary.participants_count, 0);
        assert_eq!(summary.waiting_participants_count, 2);
        let Ok(unchanged) = h.service.get_participant(req.id).await else {
            panic!("request vanished");
        };
        assert_eq!(unchanged, req);
    }

    #[tokio::test]
    async fn join_succeeds_regardless_of_capacity() {
        let h = harness();
        let event_id = event(&h.service, 0).await;
        let req = join(&h.service, event_id, 5).await;
        assert_eq!(req.state, RequestState::Waiting);
        assert_eq!(h.service.occupancy(event_id, Role::Waiting).await.ok(), Some(5));
    }

    #[tokio::test]
    async fn join_unknown_event_is_not_found() {
        let h = harness();
        let result = h.service.request_join(EventId::new(), guest(1)).await;
        assert!(matches!(result, Err(GatewayError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn join_mails_code_with_template_data() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 3).await;

        let sent = wait_for_sent(&h.notifier, 1).await;
        let Some(message) = sent.first() else {
            panic!("no email sent");
        };
        assert_eq!(message.code, req.code.as_str());
        assert_eq!(message.to, "margaret@example.com");
        assert_eq!(message.name, "Margaret");
        assert_eq!(message.party_size, 3);
        assert_eq!(message.event_name, "Moon landing party");
    }

    #[tokio::test]
    async fn failing_notifier_does_not_fail_join() {
        let h = harness_with(RecordingNotifier::failing());
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 1).await;
        assert_eq!(wait_for_sent(&h.notifier, 1).await.len(), 1);
        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn expired_request_fails_even_with_capacity_and_correct_code() {
        let h = harness();
        let event_id = event(&h.service, 100).await;
        let req = join(&h.service, event_id, 1).await;

        h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
        let result = h.service.confirm(req.id, req.code.as_str()).await;
        assert!(matches!(result, Err(GatewayError::RequestExpired)));

        let Ok(stored) = h.service.get_participant(req.id).await else {
            panic!("request vanished");
        };
        assert_eq!(stored.state, RequestState::Expired);
        assert_eq!(h.service.occupancy(event_id, Role::Confirmed).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn confirm_at_exact_expiration_still_succeeds() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 1).await;
        h.clock.advance(Duration::minutes(5));
        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn incorrect_code_wins_over_expiry_and_capacity() {
        let h = harness();
        let event_id = event(&h.service, 1).await;
        let filler = join(&h.service, event_id, 1).await;
        let req = join(&h.service, event_id, 1).await;
        assert!(h.service.confirm(filler.id, filler.code.as_str()).await.is_ok());

        let wrong = if req.code.as_str() == "0000" { "0001" } else { "0000" };
        let full = h.service.confirm(req.id, wrong).await;
        assert!(matches!(full, Err(GatewayError::IncorrectCode)));

        h.clock.advance(Duration::minutes(10));
        let expired = h.service.confirm(req.id, wrong).await;
        assert!(matches!(expired, Err(GatewayError::IncorrectCode)));
    }

    #[tokio::test]
    async fn incorrect_code_is_retryable() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 2).await;

        let padded = format!(" {}", req.code.as_str());
        assert!(matches!(
            h.service.confirm(req.id, &padded).await,
            Err(GatewayError::IncorrectCode)
        ));
        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn expired_is_terminal() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 2).await;

        h.clock.advance(Duration::minutes(6));
        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_err());
        // Even if the clock were wound back, the stored state blocks promotion.
        h.clock.advance(Duration::minutes(-6));
        assert!(matches!(
            h.service.confirm(req.id, req.code.as_str()).await,
            Err(GatewayError::RequestExpired)
        ));
    }

    #[tokio::test]
    async fn reconfirm_is_idempotent() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 4).await;

        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());
        let Ok(again) = h.service.confirm(req.id, req.code.as_str()).await else {
            panic!("re-confirmation failed");
        };
        assert_eq!(again.state, RequestState::Confirmed);
        assert_eq!(h.service.occupancy(event_id, Role::Confirmed).await.ok(), Some(4));
    }

    #[tokio::test]
    async fn confirmation_emits_event() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 2).await;
        let mut rx = h.service.event_bus().subscribe();

        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());
        let Ok(emitted) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(emitted.event_type_str(), "request_confirmed");
        assert_eq!(emitted.event_id(), event_id);
    }

    #[tokio::test]
    async fn sweep_expires_only_overdue_waiting_requests() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let old = join(&h.service, event_id, 1).await;
        let confirmed = join(&h.service, event_id, 1).await;
        assert!(h.service.confirm(confirmed.id, confirmed.code.as_str()).await.is_ok());

        h.clock.advance(Duration::minutes(4));
        let fresh = join(&h.service, event_id, 1).await;
        h.clock.advance(Duration::minutes(2));

        let Ok(expired) = h.service.expire_overdue().await else {
            panic!("sweep failed");
        };
        assert_eq!(expired, vec![old.id]);
        assert!(h.service.confirm(fresh.id, fresh.code.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn delete_event_removes_requests() {
        let h = harness();
        let event_id = event(&h.service, 10).await;
        let req = join(&h.service, event_id, 1).await;

        assert!(h.service.delete_event(event_id).await.is_ok());
        assert!(matches!(
            h.service.get_participant(req.id).await,
            Err(GatewayError::RequestNotFound(_))
        ));
        assert!(matches!(
            h.service.delete_event(event_id).await,
            Err(GatewayError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_events_reports_counts() {
        let h = harness();
        let a = event(&h.service, 10).await;
        let _b = event(&h.service, 5).await;
        let req = join(&h.service, a, 3).await;
        let _ = join(&h.service, a, 2).await;
        assert!(h.service.confirm(req.id, req.code.as_str()).await.is_ok());

        let Ok(events) = h.service.list_events().await else {
            panic!("listing failed");
        };
        assert_eq!(events.len(), 2);
        let Some(summary) = events.iter().find(|s| s.event.id == a) else {
            panic!("event missing from listing");
        };
        assert_eq!(summary.participants_count, 3);
        assert_eq!(summary.waiting_participants_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_confirmations_never_overbook() {
        let h = harness();
        let event_id = event(&h.service, 10).await;

        let mut requests = Vec::new();
        for i in 0..40u32 {
            requests.push(join(&h.service, event_id, 1 + i % 3).await);
        }

        let tasks = requests.into_iter().map(|req| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .confirm(req.id, req.code.as_str())
                    .await
                    .map(|r| u64::from(r.party_size))
            })
        });
        let results = join_all(tasks).await;

        let mut admitted = 0u64;
        for result in results {
            let Ok(outcome) = result else {
                panic!("task panicked");
            };
            match outcome {
                Ok(size) => admitted += size,
                Err(GatewayError::EventFull) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let confirmed = h.service.occupancy(event_id, Role::Confirmed).await.unwrap_or(u64::MAX);
        assert_eq!(admitted, confirmed);
        assert!(confirmed <= 10);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn confirmed_never_exceeds_capacity(
            max in 0u32..30,
            sizes in prop::collection::vec(1u32..8, 1..25),
        ) {
            let confirmed = tokio_test::block_on(async {
                let h = harness();
                let event_id = event(&h.service, max).await;
                let mut requests = Vec::new();
                for &size in &sizes {
                    requests.push(join(&h.service, event_id, size).await);
                }
                let attempts = requests
                    .iter()
                    .map(|req| h.service.confirm(req.id, req.code.as_str()));
                let _ = join_all(attempts).await;
                h.service.occupancy(event_id, Role::Confirmed).await.unwrap_or(u64::MAX)
            });
            prop_assert!(confirmed <= u64::from(max));
        }
    }
}
