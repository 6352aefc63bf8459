//! PostgreSQL implementation of the admission store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{EventRow, RequestRow};
use crate::config::GatewayConfig;
use crate::domain::capacity;
use crate::domain::{Event, EventId, ParticipantRequest, RequestId, RequestState, Role};
use crate::error::GatewayError;
use crate::store::{AdmissionStore, Promotion};

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }
}

/// Locks the event that owns request `$1` for the rest of the transaction.
///
/// `NO KEY UPDATE` conflicts with itself and with the `DELETE` of the event,
/// but not with the `KEY SHARE` lock taken by the foreign-key check on
/// `INSERT INTO participant_requests`, so joins never queue behind a
/// promotion.
pub(crate) const LOCK_EVENT_FOR_PROMOTION: &str = "SELECT e.max_participants FROM events e \
     JOIN participant_requests r ON r.event_id = e.id \
     WHERE r.id = $1 FOR NO KEY UPDATE OF e";

fn to_db_int(value: u32, field: &str) -> Result<i32, GatewayError> {
    i32::try_from(value)
        .map_err(|_| GatewayError::InvalidRequest(format!("{field} {value} is too large")))
}

#[async_trait]
impl AdmissionStore for PostgresStore {
    async fn insert_event(&self, event: Event) -> Result<Event, GatewayError> {
        sqlx::query(
            "INSERT INTO events (id, name, max_participants, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.name)
        .bind(to_db_int(event.max_participants, "max_participants")?)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(event)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, GatewayError> {
        sqlx::query_as::<_, EventRow>(
            "SELECT id, name, max_participants, created_at FROM events WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(Event::try_from)
        .transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>, GatewayError> {
        sqlx::query_as::<_, EventRow>(
            "SELECT id, name, max_participants, created_at FROM events ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Event::try_from)
        .collect()
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, GatewayError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(
        &self,
        request: ParticipantRequest,
    ) -> Result<ParticipantRequest, GatewayError> {
        sqlx::query(
            "INSERT INTO participant_requests \
             (id, event_id, name, email, party_size, code, expiration, state, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(request.id.as_uuid())
        .bind(request.event_id.as_uuid())
        .bind(&request.name)
        .bind(&request.email)
        .bind(to_db_int(request.party_size, "party_size")?)
        .bind(request.code.as_str())
        .bind(request.expiration)
        .bind(request.state.as_str())
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let missing_event =
                matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
            if missing_event {
                GatewayError::EventNotFound(*request.event_id.as_uuid())
            } else {
                GatewayError::from(e)
            }
        })?;
        Ok(request)
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError> {
        sqlx::query_as::<_, RequestRow>(
            "SELECT id, event_id, name, email, party_size, code, expiration, state, created_at, \
             confirmed_at FROM participant_requests WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(ParticipantRequest::try_from)
        .transpose()
    }

    async fn list_requests(
        &self,
        event_id: EventId,
        role: Role,
    ) -> Result<Vec<ParticipantRequest>, GatewayError> {
        let sql = match role {
            Role::Confirmed => {
                "SELECT id, event_id, name, email, party_size, code, expiration, state, \
                 created_at, confirmed_at FROM participant_requests \
                 WHERE event_id = $1 AND state = 'confirmed' ORDER BY created_at ASC"
            }
            Role::Waiting => {
                "SELECT id, event_id, name, email, party_size, code, expiration, state, \
                 created_at, confirmed_at FROM participant_requests \
                 WHERE event_id = $1 AND state <> 'confirmed' ORDER BY created_at ASC"
            }
        };
        sqlx::query_as::<_, RequestRow>(sql)
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ParticipantRequest::try_from)
            .collect()
    }

    async fn occupancy(&self, event_id: EventId, role: Role) -> Result<u64, GatewayError> {
        let sql = match role {
            Role::Confirmed => {
                "SELECT COALESCE(SUM(party_size), 0)::BIGINT FROM participant_requests \
                 WHERE event_id = $1 AND state = 'confirmed'"
            }
            Role::Waiting => {
                "SELECT COALESCE(SUM(party_size), 0)::BIGINT FROM participant_requests \
                 WHERE event_id = $1 AND state <> 'confirmed'"
            }
        };
        let total = sqlx::query_scalar::<_, i64>(sql)
            .bind(event_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn try_promote(
        &self,
        id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<Promotion, GatewayError> {
        let mut tx = self.pool.begin().await?;

        // Event row first: every promotion for the same event queues here,
        // and event deletion must take the row before cascading.
        let max_participants = sqlx::query_scalar::<_, i32>(LOCK_EVENT_FOR_PROMOTION)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(max_participants) = max_participants else {
            tx.rollback().await?;
            return Err(GatewayError::RequestNotFound(*id.as_uuid()));
        };
        let max_participants = u32::try_from(max_participants).unwrap_or(0);

        let row = sqlx::query_as::<_, RequestRow>(
            "SELECT id, event_id, name, email, party_size, code, expiration, state, created_at, \
             confirmed_at FROM participant_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Err(GatewayError::RequestNotFound(*id.as_uuid()));
        };
        let mut request = ParticipantRequest::try_from(row)?;

        match request.state {
            RequestState::Confirmed => {
                tx.commit().await?;
                return Ok(Promotion::AlreadyConfirmed(request));
            }
            RequestState::Expired => {
                tx.commit().await?;
                return Ok(Promotion::Expired {
                    request,
                    newly_expired: false,
                });
            }
            RequestState::Waiting => {}
        }

        if request.is_overdue(now) {
            sqlx::query("UPDATE participant_requests SET state = 'expired' WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            request.state = RequestState::Expired;
            return Ok(Promotion::Expired {
                request,
                newly_expired: true,
            });
        }

        let confirmed = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(party_size), 0)::BIGINT FROM participant_requests \
             WHERE event_id = $1 AND state = 'confirmed'",
        )
        .bind(request.event_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        let confirmed_total = u64::try_from(confirmed).unwrap_or(0);

        if !capacity::fits(confirmed_total, request.party_size, max_participants) {
            tx.rollback().await?;
            return Ok(Promotion::Full {
                request,
                confirmed_total,
            });
        }

        sqlx::query(
            "UPDATE participant_requests SET state = 'confirmed', confirmed_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        request.state = RequestState::Confirmed;
        request.confirmed_at = Some(now);
        let confirmed_total = confirmed_total + u64::from(request.party_size);
        Ok(Promotion::Promoted {
            request,
            confirmed_total,
        })
    }

    async fn mark_expired(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError> {
        sqlx::query_as::<_, RequestRow>(
            "UPDATE participant_requests SET state = 'expired' \
             WHERE id = $1 AND state = 'waiting' \
             RETURNING id, event_id, name, email, party_size, code, expiration, state, \
             created_at, confirmed_at",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(ParticipantRequest::try_from)
        .transpose()
    }

    async fn expire_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ParticipantRequest>, GatewayError> {
        sqlx::query_as::<_, RequestRow>(
            "UPDATE participant_requests SET state = 'expired' \
             WHERE state = 'waiting' AND expiration < $1 \
             RETURNING id, event_id, name, email, party_size, code, expiration, state, \
             created_at, confirmed_at",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ParticipantRequest::try_from)
        .collect()
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
