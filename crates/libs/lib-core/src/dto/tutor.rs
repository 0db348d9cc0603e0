//! # Tutor Data Transfer Objects
//!
//! Request and response structures for the AI explanation proxy.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/explain-math`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub topic: String,
}

/// Response body for `POST /api/explain-math`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}
