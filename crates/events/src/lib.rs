//! Domain events for the cinema backend and the services that react to them.
//!
//! Handlers publish a [`DomainEvent`] on the [`EventBus`] after committing.
//! [`EventRecorder`] keeps the durable log and [`BookingMailer`] emails
//! customers about their bookings over SMTP ([`delivery`]).

pub mod bus;
pub mod delivery;
pub mod event;
pub mod mailer;
pub mod recorder;

pub use bus::{consume, EventBus};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, EmailSender, OutgoingEmail};
pub use event::{DomainEvent, EventKind};
pub use mailer::{BookingMailer, BookingNotice};
pub use recorder::EventRecorder;
