//! HTTP API response DTOs.

use hiroma_shared::time::timestamp_to_rfc3339;
use serde::{Deserialize, Serialize};

use crate::domain::HistoryEntry;

/// `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

/// `GET /api/users/online`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersDto {
    /// Usernames in registration order
    pub users: Vec<String>,
    pub count: usize,
}

impl From<Vec<String>> for OnlineUsersDto {
    fn from(users: Vec<String>) -> Self {
        Self {
            count: users.len(),
            users,
        }
    }
}

/// One entry of `GET /api/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntryDto {
    pub sender: String,
    pub message: String,
    /// RFC 3339 (UTC)
    pub timestamp: String,
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            sender: entry.sender,
            message: entry.body,
            timestamp: timestamp_to_rfc3339(entry.recorded_at),
        }
    }
}
