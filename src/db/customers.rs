use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::connection::Database;
use super::reservations::ReservationSource;
use crate::error::{Error, Result};
use crate::models::{Customer, CustomerRecord, Reservation};

/// Columns selected by every customer query, aliased to the names that
/// [`customer_from_row`] reads back.
const CUSTOMER_COLUMNS: &str = r#"customers.id AS "id",
       customers.first_name AS "firstName",
       customers.last_name AS "lastName",
       customers.phone AS "phone",
       customers.notes AS "notes""#;

const TOP_CUSTOMER_LIMIT: i64 = 10;

/// Read a customer out of a row by column alias. Columns other than the five
/// aliases are ignored.
fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let record = CustomerRecord {
        id: row.get("id")?,
        first_name: row.get("firstName")?,
        last_name: row.get("lastName")?,
        phone: row.get("phone")?,
        notes: row.get("notes")?,
    };
    Ok(record.into())
}

impl Customer {
    /// Every customer, ordered by last name and then first name.
    pub async fn all(db: &Database) -> Result<Vec<Customer>> {
        db.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CUSTOMER_COLUMNS}
                 FROM customers
                 ORDER BY last_name, first_name"
            ))?;

            let customers = stmt
                .query_map([], customer_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(customers)
        })
        .await
    }

    /// Load one customer, failing with [`Error::NotFound`] if the id has no row.
    pub async fn get(db: &Database, id: i64) -> Result<Customer> {
        let customer = db
            .call(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {CUSTOMER_COLUMNS}
                         FROM customers
                         WHERE id = ?1"
                    ),
                    params![id],
                    customer_from_row,
                )
                .optional()
            })
            .await?;

        customer.ok_or_else(|| Error::NotFound(format!("No such customer: {id}")))
    }

    /// Up to ten customers with the most reservations, busiest first.
    /// Customers without reservations drop out through the inner join; ties
    /// come back in whatever order SQLite produces.
    pub async fn top_ten(db: &Database) -> Result<Vec<Customer>> {
        debug!("starting top customers query");
        let customers = db
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CUSTOMER_COLUMNS}
                     FROM customers
                     JOIN reservations ON customers.id = reservations.customer_id
                     GROUP BY customers.id
                     ORDER BY count(reservations.id) DESC
                     LIMIT ?1"
                ))?;

                let customers = stmt
                    .query_map(params![TOP_CUSTOMER_LIMIT], customer_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(customers)
            })
            .await?;
        debug!(count = customers.len(), "finished top customers query");

        Ok(customers)
    }

    /// Customers whose lowercased first or last name equals `name` exactly.
    /// `name` is compared as given, so callers pass it in lowercase. An empty
    /// result is reported as [`Error::NotFound`].
    pub async fn search(db: &Database, name: &str) -> Result<Vec<Customer>> {
        let needle = name.to_string();
        let customers = db
            .call(move |conn| {
                // TODO: switch to LIKE once the search box is meant to match partial names.
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CUSTOMER_COLUMNS}
                     FROM customers
                     WHERE lower(first_name) = ?1 OR lower(last_name) = ?1"
                ))?;

                let customers = stmt
                    .query_map(params![needle], customer_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(customers)
            })
            .await?;

        if customers.first().is_none() {
            return Err(Error::NotFound(format!(
                "No customer with name including: {name}"
            )));
        }

        Ok(customers)
    }

    /// Reservations booked by this customer, exactly as `source` returns them.
    /// A customer that was never saved cannot have any, so the lookup is
    /// skipped.
    pub async fn reservations<S>(&self, source: &S) -> Result<Vec<Reservation>>
    where
        S: ReservationSource + ?Sized,
    {
        match self.id() {
            Some(id) => source.reservations_for_customer(id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Insert the customer if it has no id yet, otherwise overwrite the four
    /// editable columns of its row. The insert assigns the generated id in
    /// the same statement that creates the row.
    pub async fn save(&mut self, db: &Database) -> Result<()> {
        let first_name = self.first_name.clone();
        let last_name = self.last_name.clone();
        let phone = self.phone.clone();
        let notes = self.notes.clone();

        match self.id() {
            None => {
                let id = db
                    .call(move |conn| {
                        conn.query_row(
                            "INSERT INTO customers (first_name, last_name, phone, notes)
                             VALUES (?1, ?2, ?3, ?4)
                             RETURNING id",
                            params![first_name, last_name, phone, notes],
                            |row| row.get(0),
                        )
                    })
                    .await?;
                self.assign_id(id);
                debug!(id, "inserted customer");
            }
            Some(id) => {
                db.call(move |conn| {
                    conn.execute(
                        "UPDATE customers
                         SET first_name = ?1,
                             last_name = ?2,
                             phone = ?3,
                             notes = ?4
                         WHERE id = ?5",
                        params![first_name, last_name, phone, notes, id],
                    )
                })
                .await?;
                debug!(id, "updated customer");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first_name: &str, last_name: &str) -> CustomerRecord {
        CustomerRecord {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }

    async fn saved(db: &Database, first_name: &str, last_name: &str) -> Customer {
        let mut customer = Customer::new(record(first_name, last_name));
        customer.save(db).await.unwrap();
        customer
    }

    async fn book(db: &Database, customer: &Customer, times: usize) {
        let id = customer.id().unwrap();
        db.call(move |conn| {
            for _ in 0..times {
                conn.execute(
                    "INSERT INTO reservations (customer_id, num_guests, start_at)
                     VALUES (?1, 2, '2024-05-01 19:00:00')",
                    params![id],
                )?;
            }
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn save_assigns_an_id_and_get_reads_it_back() {
        let db = Database::open_in_memory().await.unwrap();
        let mut customer = Customer::new(CustomerRecord {
            phone: Some("555-0100".to_string()),
            notes: Some("window seat".to_string()),
            ..record("Jane", "Doe")
        });

        customer.save(&db).await.unwrap();
        let id = customer.id().expect("insert assigns an id");

        let loaded = Customer::get(&db, id).await.unwrap();
        assert_eq!(loaded, customer);
    }

    #[tokio::test]
    async fn save_on_existing_customer_overwrites_all_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let mut customer = saved(&db, "Jane", "Doe").await;
        let id = customer.id();

        customer.first_name = "Janet".to_string();
        customer.last_name = "Dough".to_string();
        customer.phone = Some("555-0199".to_string());
        customer.notes = None;
        customer.save(&db).await.unwrap();

        assert_eq!(customer.id(), id);
        let loaded = Customer::get(&db, id.unwrap()).await.unwrap();
        assert_eq!(loaded.first_name, "Janet");
        assert_eq!(loaded.last_name, "Dough");
        assert_eq!(loaded.phone.as_deref(), Some("555-0199"));
        assert_eq!(loaded.notes, None);
        assert_eq!(Customer::all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();

        let err = Customer::get(&db, 42).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "No such customer: 42");
    }

    #[tokio::test]
    async fn all_orders_by_last_then_first_name() {
        let db = Database::open_in_memory().await.unwrap();
        saved(&db, "Zoe", "Adams").await;
        saved(&db, "Bob", "Smith").await;
        saved(&db, "Alice", "Smith").await;
        saved(&db, "Carl", "Brown").await;

        let names: Vec<String> = Customer::all(&db)
            .await
            .unwrap()
            .iter()
            .map(Customer::full_name)
            .collect();

        assert_eq!(
            names,
            vec!["Zoe Adams", "Carl Brown", "Alice Smith", "Bob Smith"]
        );
    }

    #[tokio::test]
    async fn all_on_empty_table_is_empty() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(Customer::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_first_or_last_name_ignoring_stored_case() {
        let db = Database::open_in_memory().await.unwrap();
        saved(&db, "Jane", "Doe").await;
        saved(&db, "John", "Jane").await;
        saved(&db, "Janet", "Smith").await;

        let found = Customer::search(&db, "jane").await.unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| {
            c.first_name.to_lowercase() == "jane" || c.last_name.to_lowercase() == "jane"
        }));
    }

    #[tokio::test]
    async fn search_is_exact_not_partial() {
        let db = Database::open_in_memory().await.unwrap();
        saved(&db, "Janet", "Smith").await;

        let err = Customer::search(&db, "jan").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No customer with name including: jan");
    }

    #[tokio::test]
    async fn search_does_not_fold_the_input() {
        let db = Database::open_in_memory().await.unwrap();
        saved(&db, "Jane", "Doe").await;

        let err = Customer::search(&db, "Jane").await.unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn top_ten_ranks_by_reservation_count() {
        let db = Database::open_in_memory().await.unwrap();
        let light = saved(&db, "Light", "Eater").await;
        let heavy = saved(&db, "Heavy", "Eater").await;
        let idle = saved(&db, "Never", "Visits").await;
        book(&db, &light, 1).await;
        book(&db, &heavy, 3).await;

        let top = Customer::top_ten(&db).await.unwrap();

        let ids: Vec<_> = top.iter().map(Customer::id).collect();
        assert_eq!(ids, vec![heavy.id(), light.id()]);
        assert!(!ids.contains(&idle.id()));
    }

    #[tokio::test]
    async fn top_ten_is_capped_at_ten() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..12 {
            let customer = saved(&db, &format!("Guest{i}"), "Regular").await;
            book(&db, &customer, i + 1).await;
        }

        let top = Customer::top_ten(&db).await.unwrap();

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].first_name, "Guest11");
        assert_eq!(top[9].first_name, "Guest2");
    }

    #[tokio::test]
    async fn unsaved_customer_has_no_reservations() {
        let db = Database::open_in_memory().await.unwrap();
        let customer = Customer::new(record("Jane", "Doe"));

        assert!(customer.reservations(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_after_out_of_band_delete_is_silent() {
        let db = Database::open_in_memory().await.unwrap();
        let mut customer = saved(&db, "Jane", "Doe").await;
        let id = customer.id().unwrap();
        db.call(move |conn| conn.execute("DELETE FROM customers WHERE id = ?1", params![id]))
            .await
            .unwrap();

        customer.notes = Some("moved away".to_string());
        customer.save(&db).await.unwrap();

        assert_eq!(customer.id(), Some(id));
        let err = Customer::get(&db, id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn storage_failures_pass_through_customer_operations() {
        let db = Database::open_in_memory().await.unwrap();
        let mut customer = Customer::new(record("Jane", "Doe"));
        db.call(|conn| conn.execute_batch("DROP TABLE reservations; DROP TABLE customers;"))
            .await
            .unwrap();

        let err = Customer::all(&db).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(err.status(), 500);

        let err = customer.save(&db).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(customer.id(), None);
    }
}
