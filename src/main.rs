// src/main.rs
mod auth;
mod config;
mod dto;
mod errors;
mod handlers;
mod models;
mod password;
mod routes;
mod services;
mod state;
mod store;

use crate::{config::Config, routes::app_router, state::AppState};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Periodically drops refresh records whose credentials have expired.
fn spawn_refresh_sweep(state: Arc<AppState>) {
    let every = state.cfg.refresh_sweep_interval_seconds;
    if every == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(every));
        loop {
            tick.tick().await;
            match state.refresh_tokens.purge_expired(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "expired refresh tokens removed"),
                Err(e) => tracing::warn!(error = %e, "refresh token sweep failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_tokens=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env().expect("load config");
    let state = Arc::new(AppState::new(&cfg).await.expect("init state"));

    spawn_refresh_sweep(state.clone());

    let app = app_router(state).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .expect("bind listener");
    tracing::info!(addr = %cfg.bind_addr, "listening");

    axum::serve(listener, app).await.expect("server error");
}
