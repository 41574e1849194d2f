//! Domain logic shared by the cinema booking backend.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API server and the event services alike.

pub mod booking;
pub mod error;
pub mod pagination;
pub mod roles;
pub mod schedule;
pub mod seating;
pub mod types;
pub mod validation;
