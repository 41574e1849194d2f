//! Outbound channels for customer notifications.

pub mod email;
