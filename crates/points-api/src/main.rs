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

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use points_api::config::Config;
use points_api::db::AppState;
use points_api::handler::create_app;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    if config.log_json {
        tracing_subscriber::fmt().with_ansi(false).json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_ansi(false).with_env_filter(filter).init();
    }

    tracing::info!("Starting points-api server");

    // Create application state with database connection
    let state = AppState::new(&config).await.context("Failed to create application state")?;
    let shared_state = Arc::new(state);

    // Create the axum application with routes
    let app = create_app(shared_state);

    tracing::info!("Server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
