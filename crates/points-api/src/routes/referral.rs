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

//! Referral enrollment workflow.
//!
//! Each wallet moves through an implicit state machine derived from the
//! registry and the edge table: no code issued, code issued, referred.
//! Nothing transitions backwards; the edge table's UNIQUE constraint keeps
//! "referred" terminal even under racing requests.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use md5::{Digest, Md5};
use utoipa;

use crate::{
    crypto,
    db::{AppState, DbError, NewUser},
    handler::{cache_control, ApiError},
    models::{
        AddressParams, CheckAddressResponse, CreateReferralRequest, ReferByResponse,
        TotalReferralResponse, UserResponse, VerifyReferralRequest, VerifyReferralResponse,
    },
    routes::validate_evm_address,
};

/// Create referral routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create-referral", post(create_referral))
        .route("/verify-referral", post(verify_referral))
        .route("/check", get(check_address))
        .route("/refer-by", get(refer_by))
        .route("/total-referral/:address", get(total_referral))
}

/// Deterministic referral code: the same wallet always gets the same code,
/// and distinct wallets cannot collide short of an address collision.
fn referral_code(evm_address: &str) -> String {
    hex::encode(Md5::digest(evm_address.to_lowercase().as_bytes()))
}

/// POST /referral/create-referral
/// Issue a referral code for a wallet
#[utoipa::path(
    post,
    path = "/referral/create-referral",
    tag = "Referral",
    request_body = CreateReferralRequest,
    responses(
        (status = 200, description = "Referral code issued", body = UserResponse),
        (status = 400, description = "Invalid address", body = crate::models::ErrorResponse),
        (status = 409, description = "Code already issued", body = crate::models::ErrorResponse)
    )
)]
async fn create_referral(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReferralRequest>,
) -> Response {
    match create_referral_impl(state, body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_referral_impl(
    state: Arc<AppState>,
    body: CreateReferralRequest,
) -> Result<UserResponse, ApiError> {
    let evm_address = validate_evm_address(&body.evm_address, "evmAddress")?;

    let existing = state.referral_db.find_user_by_address(&evm_address).await?;
    if existing.as_ref().is_some_and(|user| user.code.is_some()) {
        return Err(ApiError::Conflict(
            "This wallet has already created a referral link. Please reload the page to view it."
                .to_string(),
        ));
    }

    let code = referral_code(&evm_address);
    let user = match existing {
        // Wallet already registered (it was referred first): attach the code.
        Some(mut user) => {
            state.referral_db.set_user_code(&evm_address, &code).await?;
            user.code = Some(code);
            user
        }
        None => {
            state
                .referral_db
                .create_user(NewUser {
                    evm_address: evm_address.clone(),
                    code: Some(code),
                    refer_from: None,
                })
                .await
                .map_err(|err| match err {
                    // Lost a race against a concurrent request for the same wallet.
                    DbError::Duplicate => ApiError::Conflict(
                        "This wallet has already created a referral link. Please reload the page to view it."
                            .to_string(),
                    ),
                    other => other.into(),
                })?
        }
    };

    Ok(UserResponse {
        evm_address: user.evm_address,
        code: user.code,
        refer_from: user.refer_from,
    })
}

/// POST /referral/verify-referral
/// Redeem a referral code: verify the wallet signature, confirm the wallet
/// is new, and create the referral edge
#[utoipa::path(
    post,
    path = "/referral/verify-referral",
    tag = "Referral",
    request_body = VerifyReferralRequest,
    responses(
        (status = 200, description = "Referral accepted", body = VerifyReferralResponse),
        (status = 400, description = "Invalid request or wallet already staked", body = crate::models::ErrorResponse),
        (status = 403, description = "Signature does not match the wallet", body = crate::models::ErrorResponse),
        (status = 404, description = "Referral code not found", body = crate::models::ErrorResponse),
        (status = 409, description = "Self or duplicate referral", body = crate::models::ErrorResponse),
        (status = 502, description = "Stake oracle unreachable", body = crate::models::ErrorResponse)
    )
)]
async fn verify_referral(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyReferralRequest>,
) -> Response {
    match verify_referral_impl(state, body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn verify_referral_impl(
    state: Arc<AppState>,
    body: VerifyReferralRequest,
) -> Result<VerifyReferralResponse, ApiError> {
    let (Some(signature), Some(evm_address), Some(code)) =
        (body.signature, body.evm_address, body.code)
    else {
        return Err(ApiError::Validation("Invalid body".to_string()));
    };
    let normalized = validate_evm_address(&evm_address, "evmAddress")?;

    // Both stake oracles are consulted concurrently; a wallet with an
    // existing stake is not "new" and cannot be referred.
    let (vault_staked, marketplace_staked) = tokio::join!(
        state.vault_oracle.is_staked(&evm_address),
        state.marketplace_oracle.is_staked(&evm_address),
    );
    if vault_staked? {
        return Err(ApiError::Validation("User staked to vault".to_string()));
    }
    if marketplace_staked? {
        return Err(ApiError::Validation("User staked to marketplace".to_string()));
    }

    let message = crypto::enrollment_message(&evm_address, &code);
    let recovered =
        crypto::recover_personal_signer(&message, &signature).map_err(|_| ApiError::Signature)?;
    if format!("{recovered:#x}") != normalized {
        return Err(ApiError::Signature);
    }

    let owner = state
        .referral_db
        .find_user_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Referral code not found".to_string()))?;

    if owner.evm_address == normalized {
        return Err(ApiError::Conflict("Self referred".to_string()));
    }

    if state.referral_db.find_referrer(&normalized).await?.is_some() {
        return Err(ApiError::Conflict("Already referred".to_string()));
    }

    // The UNIQUE constraint on the edge's recipient resolves concurrent
    // enrollment: exactly one insert wins.
    state.referral_db.insert_referral(&owner.evm_address, &normalized).await.map_err(|err| {
        match err {
            DbError::Duplicate => ApiError::Conflict("Already referred".to_string()),
            other => other.into(),
        }
    })?;
    state.referral_db.ensure_user(&normalized, &owner.evm_address).await?;

    Ok(VerifyReferralResponse { message: "Verify referral code complete!".to_string() })
}

/// GET /referral/check
/// Whether a wallet has registered, plus its referral count
#[utoipa::path(
    get,
    path = "/referral/check",
    tag = "Referral",
    params(AddressParams),
    responses(
        (status = 200, description = "Registration status", body = CheckAddressResponse),
        (status = 400, description = "Missing address", body = crate::models::ErrorResponse)
    )
)]
async fn check_address(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressParams>,
) -> Response {
    match check_address_impl(state, params).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn check_address_impl(
    state: Arc<AppState>,
    params: AddressParams,
) -> Result<CheckAddressResponse, ApiError> {
    let address = params
        .address
        .ok_or_else(|| ApiError::Validation("address is required".to_string()))?
        .to_lowercase();

    let (user, total_refer) = tokio::try_join!(
        state.referral_db.find_user_by_address(&address),
        state.referral_db.count_referrals_from(&address),
    )?;

    Ok(CheckAddressResponse {
        text: if user.is_some() { "Address was signed" } else { "Address wasn't signed" }
            .to_string(),
        is_signed: user.is_some(),
        total_refer,
    })
}

/// GET /referral/refer-by
/// A wallet's referrer plus whether the wallet still counts as new
#[utoipa::path(
    get,
    path = "/referral/refer-by",
    tag = "Referral",
    params(AddressParams),
    responses(
        (status = 200, description = "Referrer lookup", body = ReferByResponse),
        (status = 400, description = "Invalid address", body = crate::models::ErrorResponse),
        (status = 502, description = "Stake oracle unreachable", body = crate::models::ErrorResponse)
    )
)]
async fn refer_by(State(state): State<Arc<AppState>>, Query(params): Query<AddressParams>) -> Response {
    match refer_by_impl(state, params).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn refer_by_impl(
    state: Arc<AppState>,
    params: AddressParams,
) -> Result<ReferByResponse, ApiError> {
    let address = params
        .address
        .ok_or_else(|| ApiError::Validation("address is required".to_string()))?;
    let normalized = validate_evm_address(&address, "address")?;

    let refer_by = state.referral_db.find_referrer(&normalized).await?;

    let (vault_staked, marketplace_staked) = tokio::join!(
        state.vault_oracle.is_staked(&normalized),
        state.marketplace_oracle.is_staked(&normalized),
    );
    let is_new_user = !vault_staked? && !marketplace_staked?;

    Ok(ReferByResponse { refer_by, is_new_user })
}

/// GET /referral/total-referral/:address
/// Referral count and accrued referral-reward points for a wallet
#[utoipa::path(
    get,
    path = "/referral/total-referral/{address}",
    tag = "Referral",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Referral totals", body = TotalReferralResponse),
        (status = 400, description = "Invalid address", body = crate::models::ErrorResponse)
    )
)]
async fn total_referral(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    match total_referral_impl(state, &address).await {
        Ok(response) => {
            let mut res = Json(response).into_response();
            res.headers_mut().insert(header::CACHE_CONTROL, cache_control("public, max-age=30"));
            res
        }
        Err(err) => err.into_response(),
    }
}

async fn total_referral_impl(
    state: Arc<AppState>,
    address: &str,
) -> Result<TotalReferralResponse, ApiError> {
    let normalized = validate_evm_address(address, "address")?;

    let (total_referral, referral_point) = tokio::try_join!(
        state.referral_db.count_referrals_from(&normalized),
        state.points_db.referral_points_for_holder(&normalized),
    )?;

    Ok(TotalReferralResponse { total_referral, referral_point })
}

#[cfg(test)]
mod tests {
    use super::referral_code;

    #[test]
    fn referral_code_is_deterministic_and_case_insensitive() {
        let a = referral_code("0xAbCdEf0123456789abcdef0123456789ABCDEF01");
        let b = referral_code("0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, referral_code("0x1111111111111111111111111111111111111111"));
    }
}
