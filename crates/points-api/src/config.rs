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

use std::net::SocketAddr;

use clap::Parser;
use url::Url;

/// Arguments for the points API server.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    /// DB connection string.
    #[clap(long, env = "DATABASE_URL")]
    pub db: String,

    /// Socket address to listen on.
    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// Hex-encoded SEC1 public key used to verify signed point batches.
    #[clap(long, env = "VERIFY_PUBLIC_KEY")]
    pub verify_public_key: String,

    /// Base URL of the marketplace stake-status service.
    #[clap(long, env = "MARKETPLACE_ENDPOINT_API")]
    pub marketplace_api: Url,

    /// Base URL of the vault stake-status service.
    #[clap(long, env = "VAULT_ENDPOINT_API")]
    pub vault_api: Url,

    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    pub log_json: bool,
}
