//! Persistence layer: PostgreSQL backend for the admission store.
//!
//! [`PostgresStore`] implements [`crate::store::AdmissionStore`] on top of
//! `sqlx::PgPool`. Promotions run in a transaction that row-locks the
//! event, which serializes concurrent confirmations for that event.
//!
//! Tests against a real database live behind the `pg-tests` feature.

pub mod models;
pub mod postgres;


pub use postgres::PostgresStore;
