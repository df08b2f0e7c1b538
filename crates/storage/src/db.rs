// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool provisioning and per-butler schema isolation.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::error::StorageError;

/// A connected, migrated pool pinned to one butler's schema. Every other
/// store in this crate takes a `&Db` (or its inner pool) and never touches
/// another schema — there is no cross-butler read path by construction.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
    schema: String,
}

impl Db {
    /// Connects to `database_url`, pins every connection's `search_path` to
    /// `schema`, creates the schema if absent, and runs core migrations.
    pub async fn connect(database_url: &str, schema: &str) -> Result<Self, StorageError> {
        let schema = schema.to_string();
        let set_search_path = schema.clone();
        let options: PgConnectOptions = database_url.parse().map_err(sqlx::Error::from)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .after_connect(move |conn, _meta| {
                let schema = set_search_path.clone();
                Box::pin(async move {
                    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool, schema })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Wraps an already-migrated pool (e.g. one provisioned by
    /// `#[sqlx::test]`) without going through [`Self::connect`]'s
    /// schema-pinning connect hook.
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_pool_for_test(pool: PgPool) -> Self {
        Self { pool, schema: "public".to_string() }
    }
}

pub(crate) static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations");

/// Re-exported for other crates' `#[sqlx::test(migrator = "...")]` harnesses;
/// the migrator itself stays `pub(crate)` since nothing outside tests needs it.
#[cfg(any(test, feature = "test-support"))]
pub static TEST_MIGRATOR: &sqlx::migrate::Migrator = &MIGRATOR;
