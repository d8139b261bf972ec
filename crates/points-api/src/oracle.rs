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

//! Stake-status oracles: external services consulted during referral
//! enrollment to decide whether a wallet already stakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub type OracleObj = Arc<dyn StakeOracle + Send + Sync>;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Cannot connect to {0} service")]
    Unavailable(String),
}

#[async_trait]
pub trait StakeOracle {
    /// Human-readable service name, used in error bodies.
    fn name(&self) -> &str;

    /// Whether the address currently has an active stake with this service.
    async fn is_staked(&self, address: &str) -> Result<bool, OracleError>;
}

#[derive(Debug, Deserialize)]
struct CheckStakedResponse {
    #[serde(rename = "isStaked")]
    is_staked: bool,
}

/// reqwest-backed oracle speaking the `/check-staked/:address` protocol.
pub struct HttpStakeOracle {
    name: String,
    base_url: Url,
    client: reqwest::Client,
}

pub fn http_oracle(name: &str, base_url: Url) -> OracleObj {
    Arc::new(HttpStakeOracle { name: name.to_string(), base_url, client: reqwest::Client::new() })
}

#[async_trait]
impl StakeOracle for HttpStakeOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_staked(&self, address: &str) -> Result<bool, OracleError> {
        let url = format!("{}/check-staked/{}", self.base_url.as_str().trim_end_matches('/'), address);
        tracing::debug!("Checking stake status at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| {
                tracing::warn!("{} oracle unreachable: {}", self.name, err);
                OracleError::Unavailable(self.name.clone())
            })?;

        let body: CheckStakedResponse = response
            .json()
            .await
            .map_err(|err| {
                tracing::warn!("{} oracle returned malformed body: {}", self.name, err);
                OracleError::Unavailable(self.name.clone())
            })?;

        Ok(body.is_staked)
    }
}
