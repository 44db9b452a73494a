// src/models/status.rs
use serde::{Deserialize, Deserializer, Serialize};
use crate::models::server::TargetServer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub online: u32,
    pub max: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<Player>,
}

/// Point-in-time status of one server, built fresh on every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub server_id: u32,
    pub server_name: String,
    pub address: String,
    #[serde(rename = "server_type")]
    pub kind: String,
    pub online: bool,
    pub version: String,
    #[serde(rename = "motd")]
    pub motd_plain: String,
    #[serde(rename = "motd_html")]
    pub motd_markup: String,
    pub players: PlayerStats,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub software: String,
}

impl StatusSnapshot {
    /// Degraded snapshot: identity only, everything else zeroed.
    pub fn offline(server: &TargetServer) -> Self {
        Self {
            server_id: server.id,
            server_name: server.name.clone(),
            address: server.address.clone(),
            kind: server.kind.clone(),
            online: false,
            version: String::new(),
            motd_plain: String::new(),
            motd_markup: String::new(),
            players: PlayerStats::default(),
            icon: String::new(),
            software: String::new(),
        }
    }

    /// Normalizes an upstream response. An upstream `online: false` is final.
    pub fn from_upstream(server: &TargetServer, resp: UpstreamStatus) -> Self {
        let mut snapshot = Self::offline(server);
        if !resp.online {
            return snapshot;
        }

        snapshot.online = true;
        snapshot.version = resp.version;
        snapshot.software = resp.software;
        snapshot.icon = resp.icon;
        snapshot.players = PlayerStats {
            online: resp.players.online,
            max: resp.players.max,
            list: resp.players.list,
        };
        snapshot.motd_plain = resp.motd.clean.join(" ");
        snapshot.motd_markup = resp.motd.html.join("<br>");
        snapshot
    }
}

/// Aggregate player totals over online entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_online: u32,
    pub total_max: u32,
}

impl Totals {
    pub fn of(snapshots: &[StatusSnapshot]) -> Self {
        snapshots
            .iter()
            .filter(|s| s.online)
            .fold(Self::default(), |acc, s| Self {
                total_online: acc.total_online.saturating_add(s.players.online),
                total_max: acc.total_max.saturating_add(s.players.max),
            })
    }
}

// Upstream status API payload (`GET /3/<address>`), consumed fields only.
// Only `online` is guaranteed; the rest is absent for offline servers.
// `null` reads as the zero value; counts are clamped into u32.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub online: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub software: String,
    #[serde(deserialize_with = "null_as_default")]
    pub motd: UpstreamMotd,
    #[serde(deserialize_with = "null_as_default")]
    pub players: UpstreamPlayers,
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamMotd {
    #[serde(deserialize_with = "null_as_default")]
    pub clean: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub html: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamPlayers {
    #[serde(deserialize_with = "clamped_count")]
    pub online: u32,
    #[serde(deserialize_with = "clamped_count")]
    pub max: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub list: Vec<Player>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn clamped_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(raw.clamp(0, u32::MAX as i64) as u32)
}
