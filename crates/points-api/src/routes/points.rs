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

//! Live-ledger endpoints: totals, history, leaderboard and signed batch
//! ingestion.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use utoipa;

use crate::{
    crypto,
    db::{AppState, HistoryFilter, Ledger},
    handler::{cache_control, ApiError},
    models::{
        EarnTodayResponse, HistoryParams, HistoryResponse, IncomingPointEvent, LeaderboardEntry,
        LeaderboardResponse, PageParams, SaveRequest, SaveResponse, TotalPointResponse,
        TotalPointV2Request, TotalPointV2Response,
    },
    rewards,
    routes::{
        display_address, total_pages, validate_evm_address, validate_holder, validate_page,
        PAGE_LIMIT,
    },
};

/// Create live-ledger routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/total-point/:holder", get(get_total_point))
        .route("/v2/total-point", post(get_total_point_v2))
        .route("/history/:holder", get(get_history))
        .route("/leaderboard", get(get_leaderboard))
        .route("/today-earn/:address", get(get_earn_today))
        .route("/save", post(save_points))
}

/// GET /total-point/:holder
/// Returns total point, dense rank and referrer for one holder
#[utoipa::path(
    get,
    path = "/total-point/{holder}",
    tag = "Points",
    params(("holder" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Holder totals", body = TotalPointResponse),
        (status = 400, description = "Invalid address", body = crate::models::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
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
    let normalized = validate_holder(holder)?;
    tracing::debug!("Fetching total point for {}", normalized);

    let record = state.points_db.total_point_for_holder(Ledger::Live, &normalized).await?;
    let referrer = state.referral_db.find_referrer(&normalized).await?;

    let (holder, total_point, rank) = match record {
        Some(record) => (record.holder, record.total_point, record.rank),
        None => {
            // A holder with no ledger rows ranks after every active holder.
            let total_holders = state.points_db.count_distinct_holders(Ledger::Live).await?;
            (normalized, 0.0, total_holders + 1)
        }
    };

    Ok(TotalPointResponse { holder, total_point, rank, reffer_from: referrer })
}

/// POST /v2/total-point
/// Totals across the EVM and Babylon address namespaces
#[utoipa::path(
    post,
    path = "/v2/total-point",
    tag = "Points",
    request_body = TotalPointV2Request,
    responses(
        (status = 200, description = "Combined totals", body = TotalPointV2Response),
        (status = 400, description = "Invalid request", body = crate::models::ErrorResponse)
    )
)]
async fn get_total_point_v2(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TotalPointV2Request>,
) -> Response {
    match get_total_point_v2_impl(state, body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_total_point_v2_impl(
    state: Arc<AppState>,
    body: TotalPointV2Request,
) -> Result<TotalPointV2Response, ApiError> {
    if body.evm_address.is_none() && body.babylon_address.is_none() {
        return Err(ApiError::Validation(
            "Require at least 1 field evmAddress or babylonAddress in request body".to_string(),
        ));
    }

    let evm_address = body
        .evm_address
        .map(|address| validate_evm_address(&address, "evmAddress"))
        .transpose()?;
    let babylon_address = body
        .babylon_address
        .map(|address| {
            if !address.starts_with("bbn") {
                return Err(ApiError::Validation(
                    "babylonAddress is invalid address".to_string(),
                ));
            }
            Ok(address.to_lowercase())
        })
        .transpose()?;

    let reffer_from = match evm_address.as_deref() {
        Some(address) => state.referral_db.find_referrer(address).await?,
        None => None,
    };

    let holders: Vec<String> =
        evm_address.iter().chain(babylon_address.iter()).cloned().collect();
    let totals = state.points_db.sum_points_for_holders(&holders).await?;

    if totals.is_empty() {
        let total_holders = state.points_db.count_distinct_holders(Ledger::Live).await?;
        return Ok(TotalPointV2Response {
            holder: evm_address,
            evm_point: 0.0,
            babylon_point: 0.0,
            total_point: 0.0,
            rank: total_holders + 1,
            reffer_from,
        });
    }

    let point_of = |address: Option<&String>| {
        address
            .and_then(|address| totals.iter().find(|t| &t.holder == address))
            .map(|t| t.total_point)
            .unwrap_or(0.0)
    };
    let evm_point = point_of(evm_address.as_ref());
    let babylon_point = point_of(babylon_address.as_ref());
    let total_point = evm_point + babylon_point;

    // Rank the combined total against every individual holder's total.
    let rank = state.points_db.count_holders_above(total_point).await? + 1;

    Ok(TotalPointV2Response {
        holder: evm_address,
        evm_point,
        babylon_point,
        total_point,
        rank,
        reffer_from,
    })
}

/// GET /history/:holder
/// Paginated event history, optionally filtered by event type
#[utoipa::path(
    get,
    path = "/history/{holder}",
    tag = "Points",
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
    match history_impl(state, Ledger::Live, &holder, params).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=60"));
            res
        }
        Err(err) => err.into_response(),
    }
}

/// Shared by the live and snapshot history endpoints. The live ledger hides
/// dust rows below 0.01 points.
pub(crate) async fn history_impl(
    state: Arc<AppState>,
    ledger: Ledger,
    holder: &str,
    params: HistoryParams,
) -> Result<HistoryResponse, ApiError> {
    let page = validate_page(params.page)?;
    let normalized = validate_holder(holder)?;

    // The extra claim filter only applies to the marketplace claim types.
    let is_btc_claim = params.event_type.as_deref().and_then(|event_type| {
        matches!(event_type, "marketplace-claim-reward" | "babylon-marketplace")
            .then(|| params.is_btc_claim.as_deref() == Some("true"))
    });

    let filter = HistoryFilter {
        holder: normalized,
        event_type: params.event_type,
        is_btc_claim,
        min_point: (ledger == Ledger::Live).then_some(0.01),
    };

    let (rows, total_document) =
        state.points_db.history_page(ledger, &filter, page, PAGE_LIMIT).await?;

    Ok(HistoryResponse {
        holder: holder.to_string(),
        total_document,
        total_page: total_pages(total_document, PAGE_LIMIT),
        page,
        data: rows.into_iter().map(Into::into).collect(),
    })
}

/// GET /leaderboard
/// Ranked holder page, padded with zero-point wallets from the holder
/// universe
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "Points",
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
    match leaderboard_impl(state, Ledger::Live, params).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=60"));
            res
        }
        Err(err) => err.into_response(),
    }
}

/// Shared by the live and snapshot leaderboard endpoints.
///
/// The ranked ledger holders come first (total descending, address
/// ascending as the deterministic tie-break); wallets known only from the
/// holder universe follow with zero points, so a page is always full while
/// holders remain.
pub(crate) async fn leaderboard_impl(
    state: Arc<AppState>,
    ledger: Ledger,
    params: PageParams,
) -> Result<LeaderboardResponse, ApiError> {
    let page = validate_page(params.page)?;
    let skip = (page - 1) * PAGE_LIMIT;

    let ledger_holders = state.points_db.distinct_holders(ledger).await?;
    let marketplace_stakers = state.points_db.marketplace_stakers().await?;

    // Universe of known wallets, deduplicated case-insensitively. BTreeMap
    // keys double as the deterministic ordering of the zero-point tail.
    let mut universe: BTreeMap<String, String> = BTreeMap::new();
    for address in ledger_holders.iter().chain(marketplace_stakers.iter()) {
        universe.entry(address.to_lowercase()).or_insert_with(|| display_address(address));
    }
    let total_document = universe.len() as u64;

    let rows = state.points_db.leaderboard_page(ledger, page, PAGE_LIMIT).await?;
    let mut data: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            holder: row.holder,
            total_point: row.total_point,
            reffer_from: row.refer_from,
        })
        .collect();

    // Append zero-point wallets falling inside this page's window.
    if data.len() < PAGE_LIMIT as usize {
        let ranked_count = state.points_db.count_distinct_holders(ledger).await?;
        let active: std::collections::HashSet<String> =
            ledger_holders.iter().map(|h| h.to_lowercase()).collect();

        let zero_start = skip.saturating_sub(ranked_count) as usize;
        let zero_holders = universe
            .iter()
            .filter(|(lower, _)| !active.contains(*lower))
            .map(|(_, display)| display.clone())
            .skip(zero_start)
            .take(PAGE_LIMIT as usize - data.len());

        for holder in zero_holders {
            data.push(LeaderboardEntry { holder, total_point: 0.0, reffer_from: None });
        }
    }

    Ok(LeaderboardResponse {
        total_document,
        total_page: total_pages(total_document, PAGE_LIMIT),
        page,
        data,
        last_update: Utc::now().to_rfc3339(),
    })
}

/// GET /today-earn/:address
/// Sum of today's non-referral points for an address
#[utoipa::path(
    get,
    path = "/today-earn/{address}",
    tag = "Points",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Points earned today", body = EarnTodayResponse)
    )
)]
async fn get_earn_today(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    match get_earn_today_impl(state, &address).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_earn_today_impl(
    state: Arc<AppState>,
    address: &str,
) -> Result<EarnTodayResponse, ApiError> {
    let normalized = validate_holder(address)?;
    let day_start = Utc::now().format("%Y-%m-%d 00:00:00").to_string();
    let point = state.points_db.today_earn(&normalized, &day_start).await?;
    Ok(EarnTodayResponse { point })
}

/// POST /save
/// Ingest a signed batch of point events
#[utoipa::path(
    post,
    path = "/save",
    tag = "Points",
    request_body = SaveRequest,
    responses(
        (status = 200, description = "Batch accepted", body = SaveResponse),
        (status = 403, description = "Invalid signature", body = crate::models::ErrorResponse),
        (status = 500, description = "Ingestion failure", body = crate::models::ErrorResponse)
    )
)]
async fn save_points(State(state): State<Arc<AppState>>, Json(body): Json<SaveRequest>) -> Response {
    match save_points_impl(state, body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn save_points_impl(
    state: Arc<AppState>,
    body: SaveRequest,
) -> Result<SaveResponse, ApiError> {
    let digest = crypto::batch_digest(&body.data);
    if !crypto::verify_batch_signature(&digest, &body.signature, &state.verify_public_key) {
        return Err(ApiError::Signature);
    }

    let events: Vec<IncomingPointEvent> = serde_json::from_value(body.data)
        .map_err(|err| ApiError::Validation(format!("Invalid batch payload: {err}")))?;

    let mut recipients: Vec<String> = events.iter().map(|e| e.holder.to_lowercase()).collect();
    recipients.sort();
    recipients.dedup();
    let referrer_of = state.referral_db.referrers_for(&recipients).await?;

    let expanded = rewards::expand_batch(&events, &referrer_of, &digest);
    let total = expanded.originals.len() + expanded.rewards.len();
    let inserted = state.points_db.insert_point_events(expanded.into_events()).await?;

    if inserted < total as u64 {
        // Expected on batch retries: rows already present are dropped by
        // their idempotency keys.
        tracing::info!("Ingested {} of {} rows (duplicates skipped)", inserted, total);
    } else {
        tracing::debug!("Ingested {} rows", inserted);
    }

    Ok(SaveResponse { status: "ok".to_string() })
}

impl From<crate::db::PointRow> for crate::models::HistoryEntry {
    fn from(row: crate::db::PointRow) -> Self {
        Self {
            holder: row.holder,
            point: row.point,
            reward_by: row.reward_by,
            reward_type: row.reward_type,
            event_type: row.event_type,
            is_btc_claim: row.is_btc_claim,
            created_at: row.created_at,
        }
    }
}
