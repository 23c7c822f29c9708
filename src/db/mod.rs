//! Persistence module split across logical submodules. Customer and
//! reservation queries are inherent methods on the models so callers write
//! `Customer::get(&db, id)` rather than reaching for free functions.

mod connection;
mod customers;
mod reservations;

pub use connection::{ensure_schema, Database};
pub use reservations::ReservationSource;
