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

//! End-to-end API tests over a temporary sqlite database, with the stake
//! oracles replaced by in-process stubs.

use std::sync::Arc;

use alloy::signers::{local::PrivateKeySigner, SignerSync};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature as EcdsaSignature, SigningKey};
use serde_json::{json, Value};
use sqlx::any::AnyPoolOptions;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use points_api::{
    crypto,
    db::{AppState, Db},
    handler::create_app,
    oracle::{OracleError, StakeOracle},
};

const ADDR_A: &str = "0x00000000000000000000000000000000000000aa";
const ADDR_B: &str = "0x00000000000000000000000000000000000000bb";
const ADDR_C: &str = "0x00000000000000000000000000000000000000cc";
const ADDR_D: &str = "0x00000000000000000000000000000000000000dd";
const BABYLON_ADDR: &str = "bbn1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5z5tpwxqergd";

/// Stake oracle stub: a fixed answer, or unavailable when `staked` is None.
struct FixedOracle {
    name: &'static str,
    staked: Option<bool>,
}

#[async_trait]
impl StakeOracle for FixedOracle {
    fn name(&self) -> &str {
        self.name
    }

    async fn is_staked(&self, _address: &str) -> Result<bool, OracleError> {
        self.staked.ok_or_else(|| OracleError::Unavailable(self.name.to_string()))
    }
}

struct TestCtx {
    app: Router,
    db_url: String,
    signing_key: SigningKey,
    _db_file: NamedTempFile,
}

impl TestCtx {
    async fn new() -> Self {
        Self::with_oracles(Some(false), Some(false)).await
    }

    async fn with_oracles(vault: Option<bool>, marketplace: Option<bool>) -> Self {
        let db_file = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite:{}", db_file.path().display());
        let db = Arc::new(Db::new(&db_url).await.unwrap());

        let signing_key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let verify_public_key = hex::encode(signing_key.verifying_key().to_sec1_bytes());

        let state = AppState {
            points_db: db.clone(),
            referral_db: db,
            marketplace_oracle: Arc::new(FixedOracle { name: "Marketplace", staked: marketplace }),
            vault_oracle: Arc::new(FixedOracle { name: "Vault", staked: vault }),
            verify_public_key,
        };

        Self { app: create_app(Arc::new(state)), db_url, signing_key, _db_file: db_file }
    }

    /// Sign `data` the way the trusted off-chain batch producer does.
    fn signed_save_body(&self, data: Value) -> Value {
        let digest = crypto::batch_digest(&data);
        let signature: EcdsaSignature = self.signing_key.sign_prehash(&digest).unwrap();
        json!({ "data": data, "signature": hex::encode(signature.to_bytes()) })
    }

    /// A second pool onto the same database, for direct table setup.
    async fn side_pool(&self) -> sqlx::AnyPool {
        AnyPoolOptions::new().connect(&self.db_url).await.unwrap()
    }

    async fn insert_referral_edge(&self, from: &str, to: &str) {
        sqlx::query("INSERT INTO referrals (from_address, to_address) VALUES ($1, $2)")
            .bind(from.to_lowercase())
            .bind(to.to_lowercase())
            .execute(&self.side_pool().await)
            .await
            .unwrap();
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request("GET", path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", path, Some(body)).await
    }
}

fn signer_address(signer: &PrivateKeySigner) -> String {
    format!("{:#x}", signer.address())
}

fn enrollment_signature(signer: &PrivateKeySigner, address: &str, code: &str) -> String {
    let message = crypto::enrollment_message(address, code);
    hex::encode(signer.sign_message_sync(message.as_bytes()).unwrap().as_bytes())
}

#[tokio::test]
async fn health_check_works() {
    let ctx = TestCtx::new().await;
    let (status, body) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unmatched_route_is_404() {
    let ctx = TestCtx::new().await;
    let (status, body) = ctx.get("/no-such-route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn save_batch_credits_holders_and_referrer() {
    let ctx = TestCtx::new().await;
    ctx.insert_referral_edge(ADDR_C, ADDR_A).await;

    let batch = json!([
        { "holder": ADDR_A, "point": 10.0, "type": "stake" },
        { "holder": ADDR_A, "point": 5.0, "type": "stake" },
        { "holder": ADDR_B, "point": 3.0, "type": "stake" },
    ]);
    let (status, body) = ctx.post("/save", ctx.signed_save_body(batch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = ctx.get(&format!("/total-point/{ADDR_A}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 15.0);
    assert_eq!(body["rank"], 1);
    assert_eq!(body["refferFrom"], ADDR_C);

    let (_, body) = ctx.get(&format!("/total-point/{ADDR_B}")).await;
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 3.0);
    assert_eq!(body["rank"], 2);

    // The referrer earned 10% of each of A's events.
    let (_, body) = ctx.get(&format!("/total-point/{ADDR_C}")).await;
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 1.5);
    assert_eq!(body["rank"], 3);
}

#[tokio::test]
async fn resubmitted_batch_changes_nothing() {
    let ctx = TestCtx::new().await;
    let batch = json!([
        { "holder": ADDR_A, "point": 10.0, "type": "stake" },
        { "holder": ADDR_B, "point": 3.0, "type": "stake" },
    ]);
    let body = ctx.signed_save_body(batch);

    let (status, _) = ctx.post("/save", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.post("/save", body).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.get(&format!("/total-point/{ADDR_A}")).await;
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 10.0);

    let (_, body) = ctx.get(&format!("/history/{ADDR_A}")).await;
    assert_eq!(body["totalDocument"], 1);
}

#[tokio::test]
async fn save_rejects_bad_signature() {
    let ctx = TestCtx::new().await;
    let mut body = ctx.signed_save_body(json!([{ "holder": ADDR_A, "point": 10.0 }]));
    // Tamper with the payload after signing.
    body["data"][0]["point"] = json!(1000.0);

    let (status, body) = ctx.post("/save", body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid signature");
}

#[tokio::test]
async fn save_rejects_malformed_batch_payload() {
    let ctx = TestCtx::new().await;
    let (status, _) =
        ctx.post("/save", ctx.signed_save_body(json!({ "not": "an array" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn holder_without_rows_ranks_after_everyone() {
    let ctx = TestCtx::new().await;
    let batch = json!([
        { "holder": ADDR_A, "point": 10.0, "type": "stake" },
        { "holder": ADDR_B, "point": 3.0, "type": "stake" },
    ]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;

    let (status, body) = ctx.get(&format!("/total-point/{ADDR_D}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 0.0);
    assert_eq!(body["rank"], 3);
}

#[tokio::test]
async fn total_point_rejects_invalid_address() {
    let ctx = TestCtx::new().await;
    let (status, _) = ctx.get("/total-point/not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_filters_type_and_claim_and_hides_dust() {
    let ctx = TestCtx::new().await;
    let batch = json!([
        { "holder": ADDR_A, "point": 10.0, "type": "stake" },
        { "holder": ADDR_A, "point": 0.005, "type": "stake" },
        { "holder": ADDR_A, "point": 2.0, "type": "marketplace-claim-reward", "isBtcClaim": true },
        { "holder": ADDR_A, "point": 3.0, "type": "marketplace-claim-reward", "isBtcClaim": false },
    ]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;

    // Dust below 0.01 never shows on the live ledger.
    let (_, body) = ctx.get(&format!("/history/{ADDR_A}")).await;
    assert_eq!(body["totalDocument"], 3);
    assert_eq!(body["totalPage"], 1);

    let (_, body) = ctx.get(&format!("/history/{ADDR_A}?type=stake")).await;
    assert_eq!(body["totalDocument"], 1);
    assert_eq!(body["data"][0]["point"].as_f64().unwrap(), 10.0);

    let (_, body) = ctx
        .get(&format!("/history/{ADDR_A}?type=marketplace-claim-reward&isBtcClaim=true"))
        .await;
    assert_eq!(body["totalDocument"], 1);
    assert_eq!(body["data"][0]["point"].as_f64().unwrap(), 2.0);
    assert_eq!(body["data"][0]["isBtcClaim"], true);

    // The claim filter is ignored for non-claim event types.
    let (_, body) = ctx.get(&format!("/history/{ADDR_A}?type=stake&isBtcClaim=true")).await;
    assert_eq!(body["totalDocument"], 1);

    let (status, _) = ctx.get(&format!("/history/{ADDR_A}?page=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn leaderboard_pads_with_zero_point_stakers() {
    let ctx = TestCtx::new().await;
    let batch = json!([
        { "holder": ADDR_A, "point": 15.0, "type": "stake" },
        { "holder": ADDR_B, "point": 3.0, "type": "stake" },
    ]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;

    sqlx::query("INSERT INTO marketplace_stakers (delegator) VALUES ($1)")
        .bind(ADDR_D)
        .execute(&ctx.side_pool().await)
        .await
        .unwrap();

    let (status, body) = ctx.get("/leaderboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocument"], 3);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["holder"].as_str().unwrap().to_lowercase(), ADDR_A);
    assert_eq!(data[0]["totalPoint"].as_f64().unwrap(), 15.0);
    assert_eq!(data[1]["holder"].as_str().unwrap().to_lowercase(), ADDR_B);
    // The marketplace staker has no ledger rows and pads the page.
    assert_eq!(data[2]["holder"].as_str().unwrap().to_lowercase(), ADDR_D);
    assert_eq!(data[2]["totalPoint"].as_f64().unwrap(), 0.0);
    assert!(body["lastUpdate"].is_string());
}

#[tokio::test]
async fn leaderboard_pages_are_contiguous() {
    let ctx = TestCtx::new().await;

    // Twelve ranked holders with strictly descending totals.
    let events: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "holder": format!("0x00000000000000000000000000000000000001{i:02}"),
                "point": (12 - i) as f64,
                "type": "stake",
            })
        })
        .collect();
    ctx.post("/save", ctx.signed_save_body(Value::Array(events))).await;

    sqlx::query("INSERT INTO marketplace_stakers (delegator) VALUES ($1)")
        .bind(ADDR_D)
        .execute(&ctx.side_pool().await)
        .await
        .unwrap();

    let (_, page1) = ctx.get("/leaderboard?page=1").await;
    let (_, page2) = ctx.get("/leaderboard?page=2").await;
    assert_eq!(page1["totalDocument"], 13);
    assert_eq!(page1["totalPage"], 2);
    assert_eq!(page1["data"].as_array().unwrap().len(), 10);

    // Page 2: the two remaining ranked holders, then the zero-point staker.
    let data2 = page2["data"].as_array().unwrap();
    assert_eq!(data2.len(), 3);
    assert_eq!(data2[0]["totalPoint"].as_f64().unwrap(), 2.0);
    assert_eq!(data2[1]["totalPoint"].as_f64().unwrap(), 1.0);
    assert_eq!(data2[2]["totalPoint"].as_f64().unwrap(), 0.0);
    assert_eq!(data2[2]["holder"].as_str().unwrap().to_lowercase(), ADDR_D);

    // No holder appears on both pages.
    let holders: Vec<String> = page1["data"]
        .as_array()
        .unwrap()
        .iter()
        .chain(data2.iter())
        .map(|entry| entry["holder"].as_str().unwrap().to_lowercase())
        .collect();
    let mut deduped = holders.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), holders.len());
}

#[tokio::test]
async fn today_earn_excludes_referral_rewards() {
    let ctx = TestCtx::new().await;
    ctx.insert_referral_edge(ADDR_C, ADDR_A).await;

    let batch = json!([{ "holder": ADDR_A, "point": 10.0, "type": "stake" }]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;

    let (_, body) = ctx.get(&format!("/today-earn/{ADDR_A}")).await;
    assert_eq!(body["point"].as_f64().unwrap(), 10.0);

    // C's only income today is a referral reward, which does not count.
    let (_, body) = ctx.get(&format!("/today-earn/{ADDR_C}")).await;
    assert_eq!(body["point"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn total_point_v2_combines_namespaces() {
    let ctx = TestCtx::new().await;
    let batch = json!([
        { "holder": ADDR_A, "point": 10.0, "type": "stake" },
        { "holder": BABYLON_ADDR, "point": 7.0, "type": "babylon-stake" },
        { "holder": ADDR_B, "point": 20.0, "type": "stake" },
    ]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;

    let (status, body) = ctx
        .post("/v2/total-point", json!({ "evmAddress": ADDR_A, "babylonAddress": BABYLON_ADDR }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evmPoint"].as_f64().unwrap(), 10.0);
    assert_eq!(body["babylonPoint"].as_f64().unwrap(), 7.0);
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 17.0);
    // Only B's 20 beats the combined 17.
    assert_eq!(body["rank"], 2);

    let (status, body) = ctx.post("/v2/total-point", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("evmAddress"));

    // Unknown addresses fall back to rank after every active holder.
    let (_, body) = ctx.post("/v2/total-point", json!({ "evmAddress": ADDR_D })).await;
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 0.0);
    assert_eq!(body["rank"], 4);
}

#[tokio::test]
async fn snapshot_endpoints_serve_the_frozen_ledger() {
    let ctx = TestCtx::new().await;
    let pool = ctx.side_pool().await;
    for (holder, point) in [(ADDR_A, 5.0), (ADDR_B, 2.0)] {
        sqlx::query("INSERT INTO snapshot (holder, point, event_type) VALUES ($1, $2, 'stake')")
            .bind(holder)
            .bind(point)
            .execute(&pool)
            .await
            .unwrap();
    }

    let (status, body) = ctx.get(&format!("/snapshot/total-point/{ADDR_A}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 5.0);
    assert_eq!(body["rank"], 1);

    // The snapshot namespace only serves EVM addresses.
    let (status, _) = ctx.get(&format!("/snapshot/total-point/{BABYLON_ADDR}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = ctx.get(&format!("/snapshot/history/{ADDR_A}")).await;
    assert_eq!(body["totalDocument"], 1);

    let (_, body) = ctx.get("/snapshot/leaderboard").await;
    assert_eq!(body["totalDocument"], 2);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["holder"].as_str().unwrap().to_lowercase(), ADDR_A);
    assert_eq!(data[1]["holder"].as_str().unwrap().to_lowercase(), ADDR_B);

    // The live ledger is untouched.
    let (_, body) = ctx.get(&format!("/total-point/{ADDR_A}")).await;
    assert_eq!(body["totalPoint"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn referral_enrollment_flow() {
    let ctx = TestCtx::new().await;
    let owner = PrivateKeySigner::random();
    let wallet = PrivateKeySigner::random();
    let owner_address = signer_address(&owner);
    let wallet_address = signer_address(&wallet);

    // Issue a code for the owner.
    let (status, body) =
        ctx.post("/referral/create-referral", json!({ "evmAddress": owner_address })).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 32);

    // Issuing twice is a conflict.
    let (status, _) =
        ctx.post("/referral/create-referral", json!({ "evmAddress": owner_address })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Redeem the code from a fresh wallet.
    let signature = enrollment_signature(&wallet, &wallet_address, &code);
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": wallet_address, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Verify referral code complete!");

    // A wallet can only ever be referred once.
    let signature = enrollment_signature(&wallet, &wallet_address, &code);
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": wallet_address, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Already referred");

    let (_, body) = ctx.get(&format!("/referral/check?address={owner_address}")).await;
    assert_eq!(body["isSigned"], true);
    assert_eq!(body["totalRefer"], 1);

    let (_, body) = ctx.get(&format!("/referral/refer-by?address={wallet_address}")).await;
    assert_eq!(body["referBy"].as_str().unwrap(), owner_address.to_lowercase());
    assert_eq!(body["isNewUser"], true);

    // The referred wallet was registered without a code and can claim one.
    let (status, body) =
        ctx.post("/referral/create-referral", json!({ "evmAddress": wallet_address })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["code"].is_string());
    assert_eq!(body["referFrom"].as_str().unwrap(), owner_address.to_lowercase());

    let (_, body) = ctx.get(&format!("/referral/total-referral/{owner_address}")).await;
    assert_eq!(body["totalReferral"], 1);
    assert_eq!(body["referralPoint"].as_f64().unwrap(), 0.0);

    // Points earned by the referred wallet accrue a 10% referrer bonus.
    let batch = json!([{ "holder": wallet_address, "point": 10.0, "type": "stake" }]);
    ctx.post("/save", ctx.signed_save_body(batch)).await;
    let (_, body) = ctx.get(&format!("/referral/total-referral/{owner_address}")).await;
    assert_eq!(body["referralPoint"].as_f64().unwrap(), 1.0);
}

#[tokio::test]
async fn verify_referral_rejections() {
    let ctx = TestCtx::new().await;
    let owner = PrivateKeySigner::random();
    let owner_address = signer_address(&owner);

    let (_, body) =
        ctx.post("/referral/create-referral", json!({ "evmAddress": owner_address })).await;
    let code = body["code"].as_str().unwrap().to_string();

    // Missing fields.
    let (status, body) =
        ctx.post("/referral/verify-referral", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid body");

    // Unknown code.
    let wallet = PrivateKeySigner::random();
    let wallet_address = signer_address(&wallet);
    let signature = enrollment_signature(&wallet, &wallet_address, "ffffffffffffffff");
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": wallet_address, "code": "ffffffffffffffff" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Referral code not found");

    // Redeeming your own code.
    let signature = enrollment_signature(&owner, &owner_address, &code);
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": owner_address, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Self referred");

    // A signature from a different wallet than the claimed address.
    let impostor = PrivateKeySigner::random();
    let signature = enrollment_signature(&impostor, &wallet_address, &code);
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": wallet_address, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid signature");
}

#[tokio::test]
async fn staked_wallets_cannot_be_referred() {
    for (vault, marketplace, message) in [
        (Some(true), Some(false), "User staked to vault"),
        (Some(false), Some(true), "User staked to marketplace"),
    ] {
        let ctx = TestCtx::with_oracles(vault, marketplace).await;
        let owner = PrivateKeySigner::random();
        let owner_address = signer_address(&owner);
        let (_, body) =
            ctx.post("/referral/create-referral", json!({ "evmAddress": owner_address })).await;
        let code = body["code"].as_str().unwrap().to_string();

        let wallet = PrivateKeySigner::random();
        let wallet_address = signer_address(&wallet);
        let signature = enrollment_signature(&wallet, &wallet_address, &code);
        let (status, body) = ctx
            .post(
                "/referral/verify-referral",
                json!({ "signature": signature, "evmAddress": wallet_address, "code": code }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn unreachable_oracle_is_a_bad_gateway() {
    let ctx = TestCtx::with_oracles(None, Some(false)).await;
    let wallet = PrivateKeySigner::random();
    let wallet_address = signer_address(&wallet);

    let signature = enrollment_signature(&wallet, &wallet_address, "c0de");
    let (status, body) = ctx
        .post(
            "/referral/verify-referral",
            json!({ "signature": signature, "evmAddress": wallet_address, "code": "c0de" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Cannot connect to Vault service");

    let (status, _) = ctx.get(&format!("/referral/refer-by?address={wallet_address}")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
