//! Background tasks.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. Tasks stop when their [`CancellationToken`]
//! is cancelled.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod session_cleanup;
