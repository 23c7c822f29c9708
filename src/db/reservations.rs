use async_trait::async_trait;
use rusqlite::{params, Row};
use tracing::debug;

use super::connection::Database;
use crate::error::Result;
use crate::models::{Reservation, ReservationRecord};

/// Anything that can list the reservations of a customer. [`Database`] is the
/// production implementation; tests and callers with their own storage can
/// supply another.
#[async_trait]
pub trait ReservationSource: Send + Sync {
    /// Every reservation whose `customer_id` is `customer_id`.
    async fn reservations_for_customer(&self, customer_id: i64) -> Result<Vec<Reservation>>;
}

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    let record = ReservationRecord {
        id: row.get("id")?,
        customer_id: row.get("customerId")?,
        num_guests: row.get("numGuests")?,
        start_at: row.get("startAt")?,
        notes: row.get("notes")?,
    };
    Ok(record.into())
}

#[async_trait]
impl ReservationSource for Database {
    /// Reservations of one customer in chronological order.
    async fn reservations_for_customer(&self, customer_id: i64) -> Result<Vec<Reservation>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id,
                          customer_id AS "customerId",
                          num_guests AS "numGuests",
                          start_at AS "startAt",
                          notes
                   FROM reservations
                   WHERE customer_id = ?1
                   ORDER BY start_at"#,
            )?;

            let reservations = stmt
                .query_map(params![customer_id], reservation_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(reservations)
        })
        .await
    }
}

impl Reservation {
    /// Insert the reservation or overwrite its row, mirroring
    /// [`Customer::save`](crate::models::Customer::save).
    pub async fn save(&mut self, db: &Database) -> Result<()> {
        let customer_id = self.customer_id;
        let num_guests = self.num_guests;
        let start_at = self.start_at;
        let notes = self.notes.clone();

        match self.id() {
            None => {
                let id = db
                    .call(move |conn| {
                        conn.query_row(
                            "INSERT INTO reservations (customer_id, num_guests, start_at, notes)
                             VALUES (?1, ?2, ?3, ?4)
                             RETURNING id",
                            params![customer_id, num_guests, start_at, notes],
                            |row| row.get(0),
                        )
                    })
                    .await?;
                self.assign_id(id);
                debug!(id, customer_id, "inserted reservation");
            }
            Some(id) => {
                db.call(move |conn| {
                    conn.execute(
                        "UPDATE reservations
                         SET customer_id = ?1,
                             num_guests = ?2,
                             start_at = ?3,
                             notes = ?4
                         WHERE id = ?5",
                        params![customer_id, num_guests, start_at, notes, id],
                    )
                })
                .await?;
                debug!(id, customer_id, "updated reservation");
            }
        }

        Ok(())
    }
}
