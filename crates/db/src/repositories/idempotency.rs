//! Idempotency keys for transfers and liquidations.
//!
//! The key row is claimed inside the same database transaction as the ledger
//! write, so a key is recorded if and only if its movement committed.

use agencia_core::ledger::LedgerError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QuerySelect, Set, SqlErr,
};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::{idempotency_keys, sea_orm_active_enums::IdempotencyScope};

/// Outcome of claiming a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Claim {
    /// First use; proceed and call [`record`] before committing.
    Fresh,
    /// Already used for the same operation; return these resources instead.
    Replay(Vec<Uuid>),
}

/// Claims `key` for `scope` in the current transaction.
///
/// A concurrent first use of the same key blocks on the primary key until the
/// other transaction finishes, then fails here with `IdempotencyInFlight`.
pub(crate) async fn claim<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    scope: IdempotencyScope,
) -> Result<Claim, RepositoryError> {
    let existing = idempotency_keys::Entity::find_by_id(key.to_string())
        .lock_exclusive()
        .one(conn)
        .await?;

    if let Some(row) = existing {
        if row.scope != scope {
            warn!(key, used_for = row.scope.as_str(), "Idempotency key reused");
            return Err(LedgerError::IdempotencyKeyReused {
                key: key.to_string(),
                scope: row.scope.as_str().to_string(),
            }
            .into());
        }
        let ids: Vec<Uuid> = serde_json::from_value(row.resource_ids)
            .map_err(|e| DbErr::Custom(format!("corrupt idempotency record '{key}': {e}")))?;
        debug!(key, "Replaying idempotent request");
        return Ok(Claim::Replay(ids));
    }

    let inserted = idempotency_keys::ActiveModel {
        key: Set(key.to_string()),
        scope: Set(scope),
        resource_ids: Set(json!([])),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(_) => Ok(Claim::Fresh),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            warn!(key, "Concurrent request with the same idempotency key");
            Err(LedgerError::IdempotencyInFlight(key.to_string()).into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Stores the resources produced under a freshly claimed key.
pub(crate) async fn record<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    resource_ids: &[Uuid],
) -> Result<(), DbErr> {
    idempotency_keys::ActiveModel {
        key: Set(key.to_string()),
        resource_ids: Set(json!(resource_ids)),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}
