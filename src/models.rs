//! Domain models that mirror the SQLite schema. They stay plain data holders;
//! the queries that load and persist them live in [`crate::db`].

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Named fields used to build a [`Customer`], either from a query row or by
/// application code preparing a customer that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerRecord {
    /// `None` for a customer that has not been inserted yet.
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// A customer of the restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Primary key. `None` until the first successful save, fixed afterwards,
    /// which is why it is only reachable through [`Customer::id`].
    id: Option<i64>,
    /// Given name, used with `last_name` for ordering and search.
    pub first_name: String,
    /// Family name, the primary sort key of [`Customer::all`].
    pub last_name: String,
    /// Contact number, stored as typed.
    pub phone: Option<String>,
    /// Free-form notes taken by the staff.
    pub notes: Option<String>,
}

impl Customer {
    /// Build a customer from its named fields.
    pub fn new(record: CustomerRecord) -> Self {
        let CustomerRecord {
            id,
            first_name,
            last_name,
            phone,
            notes,
        } = record;

        Self {
            id,
            first_name,
            last_name,
            phone,
            notes,
        }
    }

    /// Primary key, or `None` if the customer was never saved.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Only the insert path may hand out an identity.
    pub(crate) fn assign_id(&mut self, id: i64) {
        debug_assert!(self.id.is_none(), "customer id is immutable once assigned");
        self.id = Some(id);
    }

    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        Self::new(record)
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Named fields used to build a [`Reservation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRecord {
    pub id: Option<i64>,
    pub customer_id: i64,
    pub num_guests: i64,
    pub start_at: NaiveDateTime,
    pub notes: Option<String>,
}

/// A table booked by a customer. Reservations reference their customer through
/// `customer_id`; customers never hold their reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: Option<i64>,
    /// Customer the table is booked for.
    pub customer_id: i64,
    /// Party size.
    pub num_guests: i64,
    /// Local start time of the booking.
    pub start_at: NaiveDateTime,
    /// Free-form notes, e.g. allergies or occasions.
    pub notes: Option<String>,
}

impl Reservation {
    /// Build a reservation from its named fields.
    pub fn new(record: ReservationRecord) -> Self {
        let ReservationRecord {
            id,
            customer_id,
            num_guests,
            start_at,
            notes,
        } = record;

        Self {
            id,
            customer_id,
            num_guests,
            start_at,
            notes,
        }
    }

    /// Primary key, or `None` if the reservation was never saved.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: i64) {
        debug_assert!(self.id.is_none(), "reservation id is immutable once assigned");
        self.id = Some(id);
    }

    /// Start time as shown to staff, e.g. `March 4 2024, 7:30 pm`.
    pub fn formatted_start_at(&self) -> String {
        self.start_at.format("%B %-d %Y, %-I:%M %P").to_string()
    }
}

impl From<ReservationRecord> for Reservation {
    fn from(record: ReservationRecord) -> Self {
        Self::new(record)
    }
}
