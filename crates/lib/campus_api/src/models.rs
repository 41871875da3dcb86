//! Response envelopes.
//!
//! Every admin endpoint answers with a `status` discriminator; failures add
//! a numeric `code` and a human-readable `msg`.

use serde::{Deserialize, Serialize};

/// Message for a successful create.
pub const ADD_SUCCESS: &str = "Record added.";
/// Message for a successful update.
pub const UPDATE_SUCCESS: &str = "Record updated.";
/// Message for a successful delete.
pub const DELETE_SUCCESS: &str = "Record deleted.";

/// Success codes for write operations.
pub const CODE_ADDED: i32 = 1;
pub const CODE_UPDATED: i32 = 2;
pub const CODE_DELETED: i32 = 3;

/// `{"status": "success", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// `{"status": "success", "code": 1, "msg": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse<T> {
    pub status: String,
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> WriteResponse<T> {
    pub fn added(data: T) -> Self {
        Self::new(CODE_ADDED, ADD_SUCCESS, Some(data))
    }

    pub fn updated(data: T) -> Self {
        Self::new(CODE_UPDATED, UPDATE_SUCCESS, Some(data))
    }

    pub fn deleted() -> Self {
        Self::new(CODE_DELETED, DELETE_SUCCESS, None)
    }

    fn new(code: i32, msg: &str, data: Option<T>) -> Self {
        Self {
            status: "success".to_string(),
            code,
            msg: msg.to_string(),
            data,
        }
    }
}

/// `{"status": "error", "code": -5xx, "msg": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: i32,
    pub msg: String,
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub version: String,
    pub db_connected: bool,
}
