// src/models/server.rs
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One configured game server the status engine polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetServer {
    pub id: u32,
    pub name: String,
    pub address: String,
    #[serde(rename = "server_type", default)]
    pub kind: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    // Unix seconds; files written before these existed load as 0.
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

fn default_enabled() -> bool {
    true
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewServer {
    pub name: String,
    pub address: String,
    #[serde(rename = "server_type", default)]
    pub kind: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "server_type")]
    pub kind: Option<String>,
    pub sort_order: Option<i32>,
    pub enabled: Option<bool>,
}

impl TargetServer {
    pub fn apply(&mut self, patch: ServerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }
}
