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

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters for paginated endpoints. Pages are 1-based; the page
/// size is fixed at [`crate::routes::PAGE_LIMIT`].
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PageParams {
    /// Page number (default: 1)
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_page() -> u64 {
    1
}

/// Query parameters for history endpoints.
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct HistoryParams {
    /// Page number (default: 1)
    #[serde(default = "default_page")]
    pub page: u64,

    /// Optional event type filter
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    /// Extra filter applied to marketplace claim events
    #[serde(rename = "isBtcClaim")]
    pub is_btc_claim: Option<String>,
}

/// Query parameters carrying a wallet address.
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct AddressParams {
    pub address: Option<String>,
}

/// One point-award event on the wire. `type` distinguishes earn sources;
/// `rewardBy`/`rewardType` are set on synthesized referral bonuses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncomingPointEvent {
    pub holder: String,
    pub point: f64,
    #[serde(rename = "rewardBy", skip_serializing_if = "Option::is_none")]
    pub reward_by: Option<String>,
    #[serde(rename = "rewardType", skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(rename = "isBtcClaim", skip_serializing_if = "Option::is_none")]
    pub is_btc_claim: Option<bool>,
}

/// Signed batch ingestion request. `data` stays opaque JSON until the
/// signature over its canonical serialization has been checked.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveRequest {
    pub data: serde_json::Value,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveResponse {
    pub status: String,
}

/// Total point + rank + referrer for one holder.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalPointResponse {
    pub holder: String,
    #[serde(rename = "totalPoint")]
    pub total_point: f64,
    pub rank: u64,
    // Historical wire spelling existing clients depend on.
    #[serde(rename = "refferFrom", skip_serializing_if = "Option::is_none")]
    pub reffer_from: Option<String>,
}

/// v2 request: at least one of the two address namespaces is required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TotalPointV2Request {
    #[serde(rename = "evmAddress")]
    pub evm_address: Option<String>,
    #[serde(rename = "babylonAddress")]
    pub babylon_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalPointV2Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(rename = "evmPoint")]
    pub evm_point: f64,
    #[serde(rename = "babylonPoint")]
    pub babylon_point: f64,
    #[serde(rename = "totalPoint")]
    pub total_point: f64,
    pub rank: u64,
    #[serde(rename = "refferFrom", skip_serializing_if = "Option::is_none")]
    pub reffer_from: Option<String>,
}

/// One row of a paginated history page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub holder: String,
    pub point: f64,
    #[serde(rename = "rewardBy", skip_serializing_if = "Option::is_none")]
    pub reward_by: Option<String>,
    #[serde(rename = "rewardType", skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(rename = "isBtcClaim", skip_serializing_if = "Option::is_none")]
    pub is_btc_claim: Option<bool>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub holder: String,
    #[serde(rename = "totalDocument")]
    pub total_document: u64,
    #[serde(rename = "totalPage")]
    pub total_page: u64,
    pub page: u64,
    pub data: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub holder: String,
    #[serde(rename = "totalPoint")]
    pub total_point: f64,
    #[serde(rename = "refferFrom", skip_serializing_if = "Option::is_none")]
    pub reffer_from: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    #[serde(rename = "totalDocument")]
    pub total_document: u64,
    #[serde(rename = "totalPage")]
    pub total_page: u64,
    pub page: u64,
    pub data: Vec<LeaderboardEntry>,
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EarnTodayResponse {
    pub point: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReferralRequest {
    #[serde(rename = "evmAddress")]
    pub evm_address: String,
}

/// The registry record returned when a referral code is issued.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[serde(rename = "evmAddress")]
    pub evm_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "referFrom", skip_serializing_if = "Option::is_none")]
    pub refer_from: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyReferralRequest {
    pub signature: Option<String>,
    #[serde(rename = "evmAddress")]
    pub evm_address: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyReferralResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckAddressResponse {
    pub text: String,
    #[serde(rename = "isSigned")]
    pub is_signed: bool,
    #[serde(rename = "totalRefer")]
    pub total_refer: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferByResponse {
    #[serde(rename = "referBy")]
    pub refer_by: Option<String>,
    #[serde(rename = "isNewUser")]
    pub is_new_user: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalReferralResponse {
    #[serde(rename = "totalReferral")]
    pub total_referral: u64,
    #[serde(rename = "referralPoint")]
    pub referral_point: f64,
}

/// Uniform error body: every failure is `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
