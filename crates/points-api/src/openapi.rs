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

use crate::models::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staking Points API",
        version = "1.0.0",
        description = "API for the staking points program: signed point-batch ingestion, holder totals, leaderboards over the live and snapshot ledgers, and referral enrollment.",
        contact(name = "Points Program Development Team")
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Points", description = "Live-ledger totals, history, and ingestion endpoints"),
        (name = "Snapshot", description = "Frozen-ledger totals, history, and leaderboard endpoints"),
        (name = "Referral", description = "Referral code issuance and enrollment endpoints")
    ),
    paths(
        // Health check
        crate::handler::health_check,
        // Live-ledger endpoints
        crate::routes::points::get_total_point,
        crate::routes::points::get_total_point_v2,
        crate::routes::points::get_history,
        crate::routes::points::get_leaderboard,
        crate::routes::points::get_earn_today,
        crate::routes::points::save_points,
        // Snapshot endpoints
        crate::routes::snapshot::get_total_point,
        crate::routes::snapshot::get_history,
        crate::routes::snapshot::get_leaderboard,
        // Referral endpoints
        crate::routes::referral::create_referral,
        crate::routes::referral::verify_referral,
        crate::routes::referral::check_address,
        crate::routes::referral::refer_by,
        crate::routes::referral::total_referral,
    ),
    components(schemas(
        // Request models
        SaveRequest,
        IncomingPointEvent,
        TotalPointV2Request,
        CreateReferralRequest,
        VerifyReferralRequest,

        // Response models
        SaveResponse,
        TotalPointResponse,
        TotalPointV2Response,
        HistoryEntry,
        HistoryResponse,
        LeaderboardEntry,
        LeaderboardResponse,
        EarnTodayResponse,
        UserResponse,
        VerifyReferralResponse,
        CheckAddressResponse,
        ReferByResponse,
        TotalReferralResponse,

        // Query parameters
        PageParams,
        HistoryParams,
        AddressParams,

        // Errors
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
