// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Question Intake Service
//!
//! Accepts community question submissions for the portal and appends them
//! to the question spreadsheet:
//!
//! - 10 submissions per minute per client (default)
//! - Duplicate rejection against the existing questions
//! - Interview, scenario and MCQ row layouts
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env` if present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_MAX`: Submissions per window per client (default: 10)
//! - `RATE_LIMIT_WINDOW_MS`: Window length in milliseconds (default: 60000)
//! - `STORE_BACKEND`: `memory` or `sheets` (default: memory)
//! - `SHEETS_SPREADSHEET_ID`, `SHEETS_ACCESS_TOKEN`: Sheets backend credentials
//! - `DIAGNOSTICS`: Include backend error details in responses (default: false)
//! - `TRUST_FORWARDED_FOR`: Key rate limits on `X-Forwarded-For` (default: false)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use question_intake::{
    config::Config,
    handlers::{router, AppState},
    metrics::IntakeMetrics,
    pipeline::SubmissionPipeline,
    store,
    validator::SubmissionValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window_ms,
        store = ?config.store.backend,
        diagnostics = config.diagnostics,
        "Starting question intake"
    );

    // Create application state
    let question_store = store::from_config(&config.store);
    let pipeline = SubmissionPipeline::new(&config, question_store, IntakeMetrics::new()?);
    let validator = SubmissionValidator::new(config.validation.clone());

    let state = Arc::new(AppState {
        pipeline,
        validator,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.pipeline.limiter().cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
