//! Data-access layer for the Lunchly reservation app: customers and their
//! reservations stored in SQLite, queried through an async [`Database`]
//! handle.
pub mod config;
pub mod db;
pub mod error;
pub mod models;

/// Async handle to the SQLite store and the reservation lookup it implements.
pub use db::{Database, ReservationSource};
/// Error type returned by every query, with its `Result` alias.
pub use error::{Error, Result};
/// The entities and the named-field records they are built from.
pub use models::{Customer, CustomerRecord, Reservation, ReservationRecord};
