//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod booking;
pub mod category;
pub mod cinema;
pub mod event;
pub mod movie;
pub mod role;
pub mod room;
pub mod seat;
pub mod session;
pub mod user;
pub mod user_session;
