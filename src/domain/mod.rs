//! Domain layer: identifiers, events, participant requests, verification
//! codes, capacity accounting, and the event bus.

pub mod admission_event;
pub mod capacity;
pub mod clock;
pub mod code;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod participant;

pub use admission_event::{AdmissionEvent, RejectionReason};
pub use clock::{Clock, ManualClock, SystemClock};
pub use code::VerificationCode;
pub use event::{Event, EventSummary, NewEvent};
pub use event_bus::EventBus;
pub use ids::{EventId, RequestId};
pub use participant::{NewParticipant, ParticipantRequest, RequestState, Role};
