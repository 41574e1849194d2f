//! Request handlers, one submodule per resource.
//!
//! Handlers delegate to the repositories in `cinema_db`, apply the rules in
//! `cinema_core`, and map failures to [`crate::error::AppError`].

pub mod auth;
pub mod bookings;
pub mod categories;
pub mod cinemas;
pub mod events;
pub mod movies;
pub mod payments;
pub mod rooms;
pub mod sessions;
pub mod users;
