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

use async_trait::async_trait;
use sqlx::Row;

use super::{Db, DbError};

// Batch insert chunk size to avoid parameter limits
// PostgreSQL: 65535 max params, SQLite: 999-32766 params (configurable)
// Using conservative chunk size that works safely for both databases
const BATCH_INSERT_CHUNK_SIZE: usize = 100;

/// Which ledger a query runs against. The snapshot ledger is a frozen
/// point-in-time import served by the `/snapshot` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ledger {
    Live,
    Snapshot,
}

impl Ledger {
    fn table(&self) -> &'static str {
        match self {
            Ledger::Live => "points",
            Ledger::Snapshot => "snapshot",
        }
    }
}

/// A point-award event ready for insertion into the live ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPointEvent {
    /// Content-derived idempotency key. Rows sharing a key are inserted at
    /// most once; duplicate submissions are dropped silently.
    pub event_key: Option<String>,
    pub holder: String,
    pub point: f64,
    pub reward_by: Option<String>,
    pub reward_type: Option<String>,
    pub event_type: Option<String>,
    pub is_btc_claim: Option<bool>,
}

/// One ledger row as returned by history queries.
#[derive(Debug, Clone)]
pub struct PointRow {
    pub holder: String,
    pub point: f64,
    pub reward_by: Option<String>,
    pub reward_type: Option<String>,
    pub event_type: Option<String>,
    pub is_btc_claim: Option<bool>,
    pub created_at: Option<String>,
}

/// Per-holder total without rank (v2 namespace sums).
#[derive(Debug, Clone)]
pub struct HolderTotal {
    pub holder: String,
    pub total_point: f64,
}

/// Per-holder total with its dense rank over the whole ledger.
#[derive(Debug, Clone)]
pub struct HolderRank {
    pub holder: String,
    pub total_point: f64,
    pub rank: u64,
}

/// One ranked leaderboard row with the holder's referrer attached.
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub holder: String,
    pub total_point: f64,
    pub refer_from: Option<String>,
}

/// History filter. Holder equality is case-insensitive (addresses are
/// normalized to lowercase at the boundary).
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub holder: String,
    pub event_type: Option<String>,
    pub is_btc_claim: Option<bool>,
    /// The live ledger hides dust rows below this threshold.
    pub min_point: Option<f64>,
}

#[async_trait]
pub trait PointsDb {
    /// Bulk-insert a batch into the live ledger. Non-atomic and
    /// partial-failure-tolerant: rows rejected by the idempotency key are
    /// dropped silently. Returns the number of rows actually written.
    async fn insert_point_events(&self, events: Vec<NewPointEvent>) -> Result<u64, DbError>;

    /// Sum + dense rank for one holder, or None if the holder has no rows.
    async fn total_point_for_holder(
        &self,
        ledger: Ledger,
        holder: &str,
    ) -> Result<Option<HolderRank>, DbError>;

    /// Number of distinct holders in the ledger.
    async fn count_distinct_holders(&self, ledger: Ledger) -> Result<u64, DbError>;

    /// All distinct holders in the ledger.
    async fn distinct_holders(&self, ledger: Ledger) -> Result<Vec<String>, DbError>;

    /// One leaderboard page: group by holder, sum, sort descending with the
    /// holder address as deterministic tie-break, left-join referrers.
    async fn leaderboard_page(
        &self,
        ledger: Ledger,
        page: u64,
        limit: u64,
    ) -> Result<Vec<LeaderboardRow>, DbError>;

    /// One history page sorted by creation time descending, plus the total
    /// row count for the filter.
    async fn history_page(
        &self,
        ledger: Ledger,
        filter: &HistoryFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<PointRow>, u64), DbError>;

    /// Sum of a holder's points accrued since `day_start` (UTC midnight),
    /// excluding referral rewards.
    async fn today_earn(&self, holder: &str, day_start: &str) -> Result<f64, DbError>;

    /// Per-holder sums for an explicit holder set (live ledger).
    async fn sum_points_for_holders(&self, holders: &[String]) -> Result<Vec<HolderTotal>, DbError>;

    /// Number of holders whose live-ledger total strictly exceeds `total`.
    async fn count_holders_above(&self, total: f64) -> Result<u64, DbError>;

    /// Sum of referral-reward points credited to a holder.
    async fn referral_points_for_holder(&self, holder: &str) -> Result<f64, DbError>;

    /// Distinct delegators from the external marketplace staker list.
    async fn marketplace_stakers(&self) -> Result<Vec<String>, DbError>;
}

#[async_trait]
impl PointsDb for Db {
    async fn insert_point_events(&self, events: Vec<NewPointEvent>) -> Result<u64, DbError> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;
        for chunk in events.chunks(BATCH_INSERT_CHUNK_SIZE) {
            let mut values_clauses = Vec::new();
            let mut param_idx = 1;

            for _ in chunk {
                values_clauses.push(format!(
                    "(${},${},${},${},${},${},${},CURRENT_TIMESTAMP)",
                    param_idx,
                    param_idx + 1,
                    param_idx + 2,
                    param_idx + 3,
                    param_idx + 4,
                    param_idx + 5,
                    param_idx + 6
                ));
                param_idx += 7;
            }

            let query = format!(
                r#"INSERT INTO points
                (event_key, holder, point, reward_by, reward_type, event_type, is_btc_claim, created_at)
                VALUES {}
                ON CONFLICT (event_key) DO NOTHING"#,
                values_clauses.join(",")
            );

            let mut q = sqlx::query(&query);
            for event in chunk {
                q = q
                    .bind(event.event_key.clone())
                    .bind(event.holder.to_lowercase())
                    .bind(event.point)
                    .bind(event.reward_by.clone())
                    .bind(event.reward_type.clone())
                    .bind(event.event_type.clone())
                    .bind(event.is_btc_claim.map(|b| if b { 1i32 } else { 0i32 }));
            }
            let result = q.execute(&self.pool).await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn total_point_for_holder(
        &self,
        ledger: Ledger,
        holder: &str,
    ) -> Result<Option<HolderRank>, DbError> {
        let query = format!(
            r#"
            SELECT holder, total_point, holder_rank FROM (
                SELECT holder,
                       SUM(point) AS total_point,
                       DENSE_RANK() OVER (ORDER BY SUM(point) DESC) AS holder_rank
                FROM {}
                GROUP BY holder
            ) ranked
            WHERE holder = $1
            "#,
            ledger.table()
        );

        let row = sqlx::query(&query)
            .bind(holder.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| HolderRank {
            holder: row.get::<String, _>("holder"),
            total_point: row.get::<f64, _>("total_point"),
            rank: row.get::<i64, _>("holder_rank") as u64,
        }))
    }

    async fn count_distinct_holders(&self, ledger: Ledger) -> Result<u64, DbError> {
        let query =
            format!("SELECT COUNT(DISTINCT holder) AS total_holders FROM {}", ledger.table());
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>("total_holders") as u64)
    }

    async fn distinct_holders(&self, ledger: Ledger) -> Result<Vec<String>, DbError> {
        let query = format!("SELECT DISTINCT holder FROM {}", ledger.table());
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>("holder")).collect())
    }

    async fn leaderboard_page(
        &self,
        ledger: Ledger,
        page: u64,
        limit: u64,
    ) -> Result<Vec<LeaderboardRow>, DbError> {
        let query = format!(
            r#"
            SELECT totals.holder, totals.total_point, r.from_address FROM (
                SELECT holder, SUM(point) AS total_point
                FROM {}
                GROUP BY holder
            ) totals
            LEFT JOIN referrals r ON r.to_address = totals.holder
            ORDER BY totals.total_point DESC, totals.holder ASC
            LIMIT $1 OFFSET $2
            "#,
            ledger.table()
        );

        let rows = sqlx::query(&query)
            .bind(limit as i64)
            .bind(((page - 1) * limit) as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| LeaderboardRow {
                holder: row.get::<String, _>("holder"),
                total_point: row.get::<f64, _>("total_point"),
                refer_from: row.get::<Option<String>, _>("from_address"),
            })
            .collect())
    }

    async fn history_page(
        &self,
        ledger: Ledger,
        filter: &HistoryFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<PointRow>, u64), DbError> {
        let mut clauses = vec!["holder = $1".to_string()];
        let mut param_idx = 2;
        if filter.event_type.is_some() {
            clauses.push(format!("event_type = ${param_idx}"));
            param_idx += 1;
        }
        if filter.is_btc_claim.is_some() {
            clauses.push(format!("is_btc_claim = ${param_idx}"));
            param_idx += 1;
        }
        if filter.min_point.is_some() {
            clauses.push(format!("point >= ${param_idx}"));
            param_idx += 1;
        }
        let where_clause = clauses.join(" AND ");

        let count_query =
            format!("SELECT COUNT(*) AS total FROM {} WHERE {}", ledger.table(), where_clause);
        let mut count_q = sqlx::query(&count_query).bind(filter.holder.to_lowercase());
        if let Some(ref event_type) = filter.event_type {
            count_q = count_q.bind(event_type.clone());
        }
        if let Some(is_btc_claim) = filter.is_btc_claim {
            count_q = count_q.bind(if is_btc_claim { 1i32 } else { 0i32 });
        }
        if let Some(min_point) = filter.min_point {
            count_q = count_q.bind(min_point);
        }
        let count_row = count_q.fetch_one(&self.pool).await?;
        let total = count_row.get::<i64, _>("total") as u64;

        let page_query = format!(
            r#"
            SELECT holder, point, reward_by, reward_type, event_type, is_btc_claim, created_at
            FROM {}
            WHERE {}
            ORDER BY created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            ledger.table(),
            where_clause,
            param_idx,
            param_idx + 1
        );

        let mut page_q = sqlx::query(&page_query).bind(filter.holder.to_lowercase());
        if let Some(ref event_type) = filter.event_type {
            page_q = page_q.bind(event_type.clone());
        }
        if let Some(is_btc_claim) = filter.is_btc_claim {
            page_q = page_q.bind(if is_btc_claim { 1i32 } else { 0i32 });
        }
        if let Some(min_point) = filter.min_point {
            page_q = page_q.bind(min_point);
        }
        let rows = page_q
            .bind(limit as i64)
            .bind(((page - 1) * limit) as i64)
            .fetch_all(&self.pool)
            .await?;

        let rows = rows
            .into_iter()
            .map(|row| PointRow {
                holder: row.get::<String, _>("holder"),
                point: row.get::<f64, _>("point"),
                reward_by: row.get::<Option<String>, _>("reward_by"),
                reward_type: row.get::<Option<String>, _>("reward_type"),
                event_type: row.get::<Option<String>, _>("event_type"),
                is_btc_claim: row.get::<Option<i32>, _>("is_btc_claim").map(|v| v != 0),
                created_at: row.get::<Option<String>, _>("created_at"),
            })
            .collect();

        Ok((rows, total))
    }

    async fn today_earn(&self, holder: &str, day_start: &str) -> Result<f64, DbError> {
        let query = r#"
            SELECT SUM(point) AS total
            FROM points
            WHERE holder = $1
              AND created_at >= $2
              AND (event_type IS NULL OR event_type <> 'referral-reward')
        "#;

        let row = sqlx::query(query)
            .bind(holder.to_lowercase())
            .bind(day_start)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<Option<f64>, _>("total").unwrap_or(0.0))
    }

    async fn sum_points_for_holders(
        &self,
        holders: &[String],
    ) -> Result<Vec<HolderTotal>, DbError> {
        if holders.is_empty() {
            return Ok(vec![]);
        }

        let placeholders =
            (1..=holders.len()).map(|i| format!("${i}")).collect::<Vec<_>>().join(",");
        let query = format!(
            r#"
            SELECT holder, SUM(point) AS total_point
            FROM points
            WHERE holder IN ({placeholders})
            GROUP BY holder
            "#
        );

        let mut q = sqlx::query(&query);
        for holder in holders {
            q = q.bind(holder.to_lowercase());
        }
        let rows = q.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| HolderTotal {
                holder: row.get::<String, _>("holder"),
                total_point: row.get::<f64, _>("total_point"),
            })
            .collect())
    }

    async fn count_holders_above(&self, total: f64) -> Result<u64, DbError> {
        let query = r#"
            SELECT COUNT(*) AS above FROM (
                SELECT holder, SUM(point) AS total_point
                FROM points
                GROUP BY holder
            ) totals
            WHERE totals.total_point > $1
        "#;

        let row = sqlx::query(query).bind(total).fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>("above") as u64)
    }

    async fn referral_points_for_holder(&self, holder: &str) -> Result<f64, DbError> {
        let query = r#"
            SELECT SUM(point) AS total
            FROM points
            WHERE holder = $1 AND event_type = 'referral-reward'
        "#;

        let row =
            sqlx::query(query).bind(holder.to_lowercase()).fetch_one(&self.pool).await?;
        Ok(row.get::<Option<f64>, _>("total").unwrap_or(0.0))
    }

    async fn marketplace_stakers(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query("SELECT DISTINCT delegator FROM marketplace_stakers")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>("delegator")).collect())
    }
}
