//! Request and response bodies for the admin API

use serde::{Deserialize, Serialize};

use crate::registry::Target;

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterTargetRequest {
    pub connection_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterTargetResponse {
    /// Name of the target that was added
    pub target: String,
    /// Registry size right after the scheduler accepted the wake-up
    pub pending: usize,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub pending: usize,
    pub targets: Vec<Target>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
