// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod points;
pub mod referrals;

use std::sync::Arc;

use sqlx::{any::AnyPoolOptions, AnyPool};
use thiserror::Error;

pub use points::{
    HistoryFilter, HolderRank, HolderTotal, LeaderboardRow, Ledger, NewPointEvent, PointRow,
    PointsDb,
};
pub use referrals::{NewUser, ReferralDb, UserRecord};

use crate::{config::Config, oracle::OracleObj};

pub type PointsDbObj = Arc<dyn PointsDb + Send + Sync>;
pub type ReferralDbObj = Arc<dyn ReferralDb + Send + Sync>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error {0:?}")]
    SqlErr(#[from] sqlx::Error),

    #[error("SQL Migration error {0:?}")]
    MigrateErr(#[from] sqlx::migrate::MigrateError),

    #[error("duplicate key")]
    Duplicate,
}

impl DbError {
    /// Collapse unique-constraint rejections into [`DbError::Duplicate`] so
    /// callers can map them to domain conflicts.
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DbError::Duplicate;
            }
        }
        DbError::SqlErr(err)
    }
}

/// Connection-pool-backed implementation of both database traits.
pub struct Db {
    pool: AnyPool,
}

impl Db {
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new().max_connections(20).connect(database_url).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

/// Shared application state handed to every route.
pub struct AppState {
    pub points_db: PointsDbObj,
    pub referral_db: ReferralDbObj,
    pub marketplace_oracle: OracleObj,
    pub vault_oracle: OracleObj,
    /// Hex-encoded SEC1 public key of the trusted batch signer.
    pub verify_public_key: String,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, DbError> {
        let db = Arc::new(Db::new(&config.db).await?);
        Ok(Self {
            points_db: db.clone(),
            referral_db: db,
            marketplace_oracle: crate::oracle::http_oracle(
                "Marketplace",
                config.marketplace_api.clone(),
            ),
            vault_oracle: crate::oracle::http_oracle("Vault", config.vault_api.clone()),
            verify_public_key: config.verify_public_key.clone(),
        })
    }
}
