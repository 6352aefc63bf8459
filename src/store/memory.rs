//! In-memory store with per-event fine-grained locking.
//!
//! [`MemoryStore`] keeps every event in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::Mutex`]. The entry owns the
//! event's requests, so promotion (read occupancy, compare, write) happens
//! entirely under that one lock.
//!
//! # Concurrency
//!
//! - Promotions on the same event are serialized by the entry mutex.
//! - Operations on different events never share a mutex.
//! - The outer maps are only held long enough to clone an `Arc`.
//! - Deletion flags the entry under its mutex, so a writer that cloned the
//!   `Arc` before the delete sees the flag instead of writing into it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::{AdmissionStore, Promotion};
use crate::domain::capacity;
use crate::domain::{Event, EventId, ParticipantRequest, RequestId, RequestState, Role};
use crate::error::GatewayError;

/// An event together with every request linked to it.
#[derive(Debug)]
struct EventSlot {
    event: Event,
    requests: HashMap<RequestId, ParticipantRequest>,
    deleted: bool,
}

impl EventSlot {
    fn sorted(&self, role: Role) -> Vec<ParticipantRequest> {
        let mut list: Vec<_> = self
            .requests
            .values()
            .filter(|req| req.role() == role)
            .cloned()
            .collect();
        list.sort_by_key(|req| req.created_at);
        list
    }
}

/// Volatile [`AdmissionStore`] backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<HashMap<EventId, Arc<Mutex<EventSlot>>>>,
    request_index: RwLock<HashMap<RequestId, EventId>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, event_id: EventId) -> Option<Arc<Mutex<EventSlot>>> {
        self.events.read().await.get(&event_id).cloned()
    }

    async fn insert_into_slot(
        &self,
        slot: &Mutex<EventSlot>,
        request: ParticipantRequest,
    ) -> Result<ParticipantRequest, GatewayError> {
        let mut slot = slot.lock().await;
        if slot.deleted {
            return Err(GatewayError::EventNotFound(*request.event_id.as_uuid()));
        }
        self.request_index
            .write()
            .await
            .insert(request.id, request.event_id);
        slot.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn slot_for_request(&self, id: RequestId) -> Option<Arc<Mutex<EventSlot>>> {
        let event_id = self.request_index.read().await.get(&id).copied()?;
        self.slot(event_id).await
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn insert_event(&self, event: Event) -> Result<Event, GatewayError> {
        let mut map = self.events.write().await;
        if map.contains_key(&event.id) {
            return Err(GatewayError::Internal(format!(
                "event {} already exists",
                event.id
            )));
        }
        let slot = EventSlot {
            event: event.clone(),
            requests: HashMap::new(),
            deleted: false,
        };
        map.insert(event.id, Arc::new(Mutex::new(slot)));
        Ok(event)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, GatewayError> {
        let Some(slot) = self.slot(id).await else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(Some(slot.event.clone()))
    }

    async fn list_events(&self) -> Result<Vec<Event>, GatewayError> {
        let slots: Vec<_> = self.events.read().await.values().cloned().collect();
        let mut events = Vec::with_capacity(slots.len());
        for slot in slots {
            events.push(slot.lock().await.event.clone());
        }
        events.sort_by_key(|event| event.created_at);
        Ok(events)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, GatewayError> {
        let Some(slot) = self.events.write().await.remove(&id) else {
            return Ok(false);
        };
        let mut slot = slot.lock().await;
        slot.deleted = true;
        let mut index = self.request_index.write().await;
        for request_id in slot.requests.keys() {
            index.remove(request_id);
        }
        Ok(true)
    }

    async fn insert_request(
        &self,
        request: ParticipantRequest,
    ) -> Result<ParticipantRequest, GatewayError> {
        let slot = self
            .slot(request.event_id)
            .await
            .ok_or(GatewayError::EventNotFound(*request.event_id.as_uuid()))?;
        self.insert_into_slot(&slot, request).await
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError> {
        let Some(slot) = self.slot_for_request(id).await else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(slot.requests.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        event_id: EventId,
        role: Role,
    ) -> Result<Vec<ParticipantRequest>, GatewayError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(Vec::new());
        };
        let slot = slot.lock().await;
        Ok(slot.sorted(role))
    }

    async fn occupancy(&self, event_id: EventId, role: Role) -> Result<u64, GatewayError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(0);
        };
        let slot = slot.lock().await;
        Ok(capacity::occupancy(slot.requests.values(), role))
    }

    async fn try_promote(
        &self,
        id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<Promotion, GatewayError> {
        let not_found = || GatewayError::RequestNotFound(*id.as_uuid());
        let slot = self.slot_for_request(id).await.ok_or_else(not_found)?;
        let mut guard = slot.lock().await;
        let slot = &mut *guard;

        let confirmed_total = capacity::occupancy(slot.requests.values(), Role::Confirmed);
        let max_participants = slot.event.max_participants;
        let request = slot.requests.get_mut(&id).ok_or_else(not_found)?;

        match request.state {
            RequestState::Confirmed => return Ok(Promotion::AlreadyConfirmed(request.clone())),
            RequestState::Expired => {
                return Ok(Promotion::Expired {
                    request: request.clone(),
                    newly_expired: false,
                });
            }
            RequestState::Waiting => {}
        }

        if request.is_overdue(now) {
            request.state = RequestState::Expired;
            return Ok(Promotion::Expired {
                request: request.clone(),
                newly_expired: true,
            });
        }

        if !capacity::fits(confirmed_total, request.party_size, max_participants) {
            return Ok(Promotion::Full {
                request: request.clone(),
                confirmed_total,
            });
        }

        request.state = RequestState::Confirmed;
        request.confirmed_at = Some(now);
        Ok(Promotion::Promoted {
            request: request.clone(),
            confirmed_total: confirmed_total + u64::from(request.party_size),
        })
    }

    async fn mark_expired(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError> {
        let Some(slot) = self.slot_for_request(id).await else {
            return Ok(None);
        };
        let mut slot = slot.lock().await;
        let Some(request) = slot.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.state != RequestState::Waiting {
            return Ok(None);
        }
        request.state = RequestState::Expired;
        Ok(Some(request.clone()))
    }

    async fn expire_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ParticipantRequest>, GatewayError> {
        let slots: Vec<_> = self.events.read().await.values().cloned().collect();
        let mut expired = Vec::new();
        for slot in slots {
            let mut slot = slot.lock().await;
            for request in slot.requests.values_mut() {
                if request.state == RequestState::Waiting && request.is_overdue(now) {
                    request.state = RequestState::Expired;
                    expired.push(request.clone());
                }
            }
        }
        Ok(expired)
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
