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

//! Frozen-ledger endpoints, serving the point-in-time snapshot import.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use utoipa;

use crate::{
    db::{AppState, Ledger},
    handler::{cache_control, ApiError},
    models::{HistoryParams, HistoryResponse, LeaderboardResponse, PageParams, TotalPointResponse},
    routes::{
        points::{history_impl, leaderboard_impl},
        validate_evm_address,
    },
};

/// Create snapshot routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/total-point/:holder", get(get_total_point))
        .route("/history/:holder", get(get_history))
        .route("/leaderboard", get(get_leaderboard))
}

/// GET /snapshot/total-point/:holder
/// Holder totals over the frozen ledger
#[utoipa::path(
    get,
    path = "/snapshot/total-point/{holder}",
    tag = "Snapshot",
    params(("holder" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Holder totals", body = TotalPointResponse),
        (status = 400, description = "Invalid address", body = crate::models::ErrorResponse)
    )
)]
async fn get_total_point(
    State(state): State<Arc<AppState>>,
    Path(holder): Path<String>,
) -> Response {
    match get_total_point_impl(state, &holder).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=60"));
            res
        }
        Err(err) => err.into_response(),
    }
}

async fn get_total_point_impl(
    state: Arc<AppState>,
    holder: &str,
) -> Result<TotalPointResponse, ApiError> {
    let normalized = validate_evm_address(holder, "holder")?;

    let record = state.points_db.total_point_for_holder(Ledger::Snapshot, &normalized).await?;
    let referrer = state.referral_db.find_referrer(&normalized).await?;

    let (holder, total_point, rank) = match record {
        Some(record) => (record.holder, record.total_point, record.rank),
        None => {
            let total_holders = state.points_db.count_distinct_holders(Ledger::Snapshot).await?;
            (normalized, 0.0, total_holders + 1)
        }
    };

    Ok(TotalPointResponse { holder, total_point, rank, reffer_from: referrer })
}

/// GET /snapshot/history/:holder
/// Paginated history over the frozen ledger
#[utoipa::path(
    get,
    path = "/snapshot/history/{holder}",
    tag = "Snapshot",
    params(("holder" = String, Path, description = "Wallet address"), HistoryParams),
    responses(
        (status = 200, description = "Event history page", body = HistoryResponse),
        (status = 400, description = "Invalid request", body = crate::models::ErrorResponse)
    )
)]
async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(holder): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match history_impl(state, Ledger::Snapshot, &holder, params).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=60"));
            res
        }
        Err(err) => err.into_response(),
    }
}

/// GET /snapshot/leaderboard
/// Ranked holder page over the frozen ledger
#[utoipa::path(
    get,
    path = "/snapshot/leaderboard",
    tag = "Snapshot",
    params(PageParams),
    responses(
        (status = 200, description = "Leaderboard page", body = LeaderboardResponse),
        (status = 400, description = "Invalid page", body = crate::models::ErrorResponse)
    )
)]
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Response {
    match leaderboard_impl(state, Ledger::Snapshot, params).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=60"));
            res
        }
        Err(err) => err.into_response(),
    }
}
