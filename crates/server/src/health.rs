//! Liveness endpoint

use api_types::health::Health;
use axum::{Json, extract::State};
use chrono::Utc;

use crate::server::ServerState;

pub async fn get(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        email_configured: state.mailer.is_configured(),
    })
}
