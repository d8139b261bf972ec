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

//! HTTP API for the staking points program: signed point-batch ingestion,
//! holder totals and leaderboards over the live and snapshot ledgers, and
//! the referral enrollment workflow.

pub mod config;
pub mod crypto;
pub mod db;
pub mod handler;
pub mod models;
pub mod openapi;
pub mod oracle;
pub mod rewards;
pub mod routes;
