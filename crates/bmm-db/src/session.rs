//! Sessions, transactions and transaction-scoped advisory locks.
//!
//! Every DAO method accepts `Option<&mut Tx>`: `None` runs the statement on
//! a pooled connection, `Some(tx)` enlists it in the caller's transaction.

use crate::DatabasePoolInterface;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use bmm_config::{AdvisoryLockConfig, DatabaseConfig};
use bmm_core::{BmmError, BmmResult, Interface};
use chrono::{DateTime, SubsecRound, Utc};
use shaku::Component;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;
const ADVISORY_LOCK_MASK: u64 = 0x7fff_ffff_ffff_ffff;

/// Current time at the precision PostgreSQL stores (microseconds).
#[must_use]
pub fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Derives a positive advisory lock id from an arbitrary key (FNV-1a, 63 bits).
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn advisory_lock_id(key: &str) -> i64 {
    let hash = key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    (hash & ADVISORY_LOCK_MASK) as i64
}

/// Opens transactions.
#[async_trait]
pub trait SessionInterface: Interface + Send + Sync {
    /// Begins a transaction with the configured `lock_timeout`.
    async fn begin_tx(&self) -> BmmResult<Tx>;
}

/// Session bound to the shared pool.
#[derive(Component)]
#[shaku(interface = SessionInterface)]
pub struct Session {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
    lock_timeout_secs: u64,
    advisory_lock: AdvisoryLockConfig,
}

impl Session {
    /// Creates a session from the pool and database configuration.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            lock_timeout_secs: config.lock_timeout_secs,
            advisory_lock: config.advisory_lock.clone(),
        }
    }
}

#[async_trait]
impl SessionInterface for Session {
    async fn begin_tx(&self) -> BmmResult<Tx> {
        let mut inner = self.pool.inner().begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}s", self.lock_timeout_secs))
            .execute(&mut *inner)
            .await?;

        debug!(lock_timeout_secs = self.lock_timeout_secs, "Transaction started");
        Ok(Tx {
            inner,
            advisory_lock: self.advisory_lock.clone(),
        })
    }
}

/// An open transaction.
///
/// Dropping a `Tx` without calling [`commit`](Self::commit) rolls it back.
pub struct Tx {
    inner: Transaction<'static, Postgres>,
    advisory_lock: AdvisoryLockConfig,
}

impl Tx {
    /// Commits the transaction.
    pub async fn commit(self) -> BmmResult<()> {
        self.inner.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls the transaction back.
    pub async fn rollback(self) -> BmmResult<()> {
        self.inner.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Returns the connection the transaction runs on.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.inner
    }

    /// Acquires a transaction-scoped advisory lock.
    ///
    /// Blocking waits (bounded by `lock_timeout`); non-blocking fails with
    /// [`BmmError::AdvisoryLockFailed`] when another transaction holds it.
    /// The lock is released when the transaction ends.
    pub async fn acquire_advisory_lock(&mut self, lock_id: i64, blocking: bool) -> BmmResult<()> {
        if blocking {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(lock_id)
                .execute(&mut *self.inner)
                .await?;
            return Ok(());
        }

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(lock_id)
            .fetch_one(&mut *self.inner)
            .await?;

        if acquired {
            Ok(())
        } else {
            Err(BmmError::AdvisoryLockFailed { lock_id })
        }
    }

    /// Retries non-blocking acquisition with exponential backoff and jitter.
    pub async fn try_acquire_advisory_lock(&mut self, lock_id: i64) -> BmmResult<()> {
        let policy = self.advisory_lock.clone();
        let mut backoff = lock_backoff(&policy);
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.acquire_advisory_lock(lock_id, false).await {
                Ok(()) => return Ok(()),
                Err(BmmError::AdvisoryLockFailed { .. }) if attempt < max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or_else(|| policy.initial_delay());
                    debug!(lock_id, attempt, ?delay, "Advisory lock busy, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(lock_id, attempt, error = %e, "Advisory lock acquisition failed");
                    return Err(e);
                }
            }
        }

        Err(BmmError::AdvisoryLockFailed { lock_id })
    }
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx").finish_non_exhaustive()
    }
}

/// Exponential backoff whose randomization spans the configured jitter.
#[allow(clippy::cast_precision_loss)]
fn lock_backoff(policy: &AdvisoryLockConfig) -> backoff::ExponentialBackoff {
    let initial = policy.initial_delay();
    let randomization = if initial.is_zero() {
        0.0
    } else {
        (policy.max_jitter().as_millis() as f64 / initial.as_millis() as f64).min(1.0)
    };

    ExponentialBackoffBuilder::new()
        .with_initial_interval(initial)
        .with_multiplier(policy.multiplier)
        .with_randomization_factor(randomization)
        .with_max_interval(initial * 2u32.pow(policy.max_attempts.min(16)))
        .with_max_elapsed_time(None)
        .build()
}

/// A connection borrowed either from the pool or from a caller's transaction.
pub enum DbConn<'c> {
    /// Pool checkout, returned on drop.
    Pooled(PoolConnection<Postgres>),
    /// Caller's transaction.
    Tx(&'c mut PgConnection),
}

impl<'c> DbConn<'c> {
    /// Resolves the connection a DAO call should run on.
    pub async fn acquire(pool: &PgPool, tx: Option<&'c mut Tx>) -> BmmResult<Self> {
        match tx {
            Some(tx) => Ok(Self::Tx(tx.connection())),
            None => Ok(Self::Pooled(pool.acquire().await?)),
        }
    }
}

impl Deref for DbConn<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Pooled(conn) => conn,
            Self::Tx(conn) => conn,
        }
    }
}

impl DerefMut for DbConn<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Pooled(conn) => conn,
            Self::Tx(conn) => conn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_advisory_lock_id_is_stable_and_positive() {
        let a = advisory_lock_id("site-7f3e/ip-block");
        let b = advisory_lock_id("site-7f3e/ip-block");
        assert_eq!(a, b);
        assert!(a >= 0);
        assert_ne!(a, advisory_lock_id("site-7f3e/ip-block-2"));
    }

    #[test]
    fn test_advisory_lock_id_known_value() {
        // FNV-1a("a") = 0xaf63dc4c8601ec8c, masked to 63 bits.
        assert_eq!(advisory_lock_id("a"), 0x2f63_dc4c_8601_ec8c);
        assert_eq!(advisory_lock_id(""), 0x4bf2_9ce4_8422_2325);
    }

    #[test]
    fn test_db_now_has_microsecond_precision() {
        let now = db_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_lock_backoff_grows() {
        let policy = AdvisoryLockConfig {
            max_attempts: 3,
            initial_delay_ms: 300,
            multiplier: 2.0,
            max_jitter_ms: 0,
        };
        let mut backoff = lock_backoff(&policy);
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(600)));
    }

    #[test]
    fn test_lock_backoff_jitter_is_bounded() {
        let policy = AdvisoryLockConfig::default();
        let mut backoff = lock_backoff(&policy);
        let first = backoff.next_backoff().unwrap();
        assert!(first >= Duration::from_millis(200));
        assert!(first <= Duration::from_millis(400));
    }
}
