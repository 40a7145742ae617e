// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Liveness handler.

use axum::{extract::State, Json};

use crate::response::PingResponse;
use crate::state::AppState;

/// GET /api/v4/ping
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse::new(&*state.service_name))
}
