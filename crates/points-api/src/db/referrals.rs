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

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::Row;

use super::{Db, DbError};

/// One row of the wallet registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub evm_address: String,
    pub code: Option<String>,
    pub refer_from: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub evm_address: String,
    pub code: Option<String>,
    pub refer_from: Option<String>,
}

#[async_trait]
pub trait ReferralDb {
    /// Referrer of `to`, if an edge exists.
    async fn find_referrer(&self, to: &str) -> Result<Option<String>, DbError>;

    /// Referrer lookup for a whole batch of recipients in one query.
    async fn referrers_for(&self, tos: &[String]) -> Result<HashMap<String, String>, DbError>;

    /// Create a referral edge. A second edge for the same `to` fails with
    /// [`DbError::Duplicate`], also under concurrent inserts.
    async fn insert_referral(&self, from: &str, to: &str) -> Result<(), DbError>;

    /// Number of wallets referred by `from`.
    async fn count_referrals_from(&self, from: &str) -> Result<u64, DbError>;

    async fn find_user_by_address(&self, address: &str) -> Result<Option<UserRecord>, DbError>;

    async fn find_user_by_code(&self, code: &str) -> Result<Option<UserRecord>, DbError>;

    /// Insert a user record; duplicate addresses or codes fail with
    /// [`DbError::Duplicate`].
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, DbError>;

    /// Set the referral code on an existing codeless record.
    async fn set_user_code(&self, address: &str, code: &str) -> Result<(), DbError>;

    /// Create a registry row for `address` if none exists yet.
    async fn ensure_user(&self, address: &str, refer_from: &str) -> Result<(), DbError>;
}

fn user_from_row(row: sqlx::any::AnyRow) -> UserRecord {
    UserRecord {
        evm_address: row.get::<String, _>("evm_address"),
        code: row.get::<Option<String>, _>("code"),
        refer_from: row.get::<Option<String>, _>("refer_from"),
    }
}

#[async_trait]
impl ReferralDb for Db {
    async fn find_referrer(&self, to: &str) -> Result<Option<String>, DbError> {
        let row = sqlx::query("SELECT from_address FROM referrals WHERE to_address = $1")
            .bind(to.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get::<String, _>("from_address")))
    }

    async fn referrers_for(&self, tos: &[String]) -> Result<HashMap<String, String>, DbError> {
        if tos.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = (1..=tos.len()).map(|i| format!("${i}")).collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT from_address, to_address FROM referrals WHERE to_address IN ({placeholders})"
        );

        let mut q = sqlx::query(&query);
        for to in tos {
            q = q.bind(to.to_lowercase());
        }
        let rows = q.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (row.get::<String, _>("to_address"), row.get::<String, _>("from_address"))
            })
            .collect())
    }

    async fn insert_referral(&self, from: &str, to: &str) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO referrals (from_address, to_address, created_at) VALUES ($1, $2, CURRENT_TIMESTAMP)",
        )
        .bind(from.to_lowercase())
        .bind(to.to_lowercase())
        .execute(&self.pool)
        .await
        .map_err(DbError::from_insert)?;
        Ok(())
    }

    async fn count_referrals_from(&self, from: &str) -> Result<u64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM referrals WHERE from_address = $1")
            .bind(from.to_lowercase())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("total") as u64)
    }

    async fn find_user_by_address(&self, address: &str) -> Result<Option<UserRecord>, DbError> {
        let row =
            sqlx::query("SELECT evm_address, code, refer_from FROM users WHERE evm_address = $1")
                .bind(address.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_user_by_code(&self, code: &str) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query("SELECT evm_address, code, refer_from FROM users WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_row))
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, DbError> {
        sqlx::query(
            "INSERT INTO users (evm_address, code, refer_from, created_at) VALUES ($1, $2, $3, CURRENT_TIMESTAMP)",
        )
        .bind(user.evm_address.to_lowercase())
        .bind(user.code.clone())
        .bind(user.refer_from.clone())
        .execute(&self.pool)
        .await
        .map_err(DbError::from_insert)?;

        Ok(UserRecord {
            evm_address: user.evm_address.to_lowercase(),
            code: user.code,
            refer_from: user.refer_from,
        })
    }

    async fn set_user_code(&self, address: &str, code: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET code = $2 WHERE evm_address = $1 AND code IS NULL")
            .bind(address.to_lowercase())
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_insert)?;
        Ok(())
    }

    async fn ensure_user(&self, address: &str, refer_from: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"INSERT INTO users (evm_address, code, refer_from, created_at)
               VALUES ($1, NULL, $2, CURRENT_TIMESTAMP)
               ON CONFLICT (evm_address) DO NOTHING"#,
        )
        .bind(address.to_lowercase())
        .bind(refer_from.to_lowercase())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
