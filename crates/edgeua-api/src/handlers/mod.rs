// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers.
//!
//! - [`method`]: `POST /api/v4/call`
//! - [`ping`]: `GET /api/v4/ping`

mod method;
mod ping;

pub use method::*;
pub use ping::*;
