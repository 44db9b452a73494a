// src/utils.rs
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use governor::{RateLimiter, clock::DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use log::{debug, warn};
use serde_json::json;
use std::fmt;
use std::net::IpAddr;
use crate::config::Config;
use crate::storage::memory::RegistryError;

#[derive(Debug)]
pub enum RequestError {
    MissingPeerIP,
    Unauthorized,
    Forbidden,
    RateLimitExceeded,
    NotFound(String),
    InvalidId(String),
    InvalidBody(String),
    Storage(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPeerIP => write!(f, "Failed to extract client IP"),
            Self::Unauthorized => write!(f, "Missing or malformed bearer token"),
            Self::Forbidden => write!(f, "Admin access required"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            Self::NotFound(what) => write!(f, "{} not found", what),
            Self::InvalidId(raw) => write!(f, "Invalid id: {}", raw),
            Self::InvalidBody(msg) => write!(f, "Invalid request body: {}", msg),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<RegistryError> for RequestError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => Self::NotFound(format!("Server {}", id)),
            RegistryError::Invalid(msg) => Self::InvalidBody(msg.to_string()),
            RegistryError::Io(e) => Self::Storage(e.to_string()),
        }
    }
}

pub type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Per-IP limiter for the public status reads.
pub struct StatusReadLimiter(pub KeyedLimiter);

/// Per-IP limiter for manual refresh triggers.
pub struct RefreshLimiter(pub KeyedLimiter);

pub fn peer_ip(req: &HttpRequest) -> Result<IpAddr, RequestError> {
    req.peer_addr()
        .map(|addr| addr.ip())
        .ok_or(RequestError::MissingPeerIP)
}

pub fn check_rate(limiter: &KeyedLimiter, req: &HttpRequest, what: &str) -> Result<(), RequestError> {
    let ip = peer_ip(req)?;
    if limiter.check_key(&ip).is_err() {
        warn!("Rate limit exceeded for {} from {}", what, ip);
        return Err(RequestError::RateLimitExceeded);
    }
    Ok(())
}

pub fn parse_id(raw: &str) -> Result<u32, RequestError> {
    raw.parse().map_err(|_| RequestError::InvalidId(raw.to_string()))
}

/// Checks `Authorization: Bearer <ADMIN_TOKEN>`.
pub fn require_admin(req: &HttpRequest, config: &Config) -> Result<(), RequestError> {
    let token = req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RequestError::Unauthorized)?;

    match &config.admin_token {
        Some(expected) if tokens_match(expected.as_bytes(), token.as_bytes()) => Ok(()),
        Some(_) => {
            debug!("Rejected admin request with wrong token from {:?}", req.peer_addr());
            Err(RequestError::Forbidden)
        }
        None => {
            warn!("Admin request rejected: ADMIN_TOKEN is not configured");
            Err(RequestError::Forbidden)
        }
    }
}

// Runs over every byte regardless of where the first mismatch is.
fn tokens_match(expected: &[u8], given: &[u8]) -> bool {
    if expected.len() != given.len() {
        return false;
    }
    expected
        .iter()
        .zip(given)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
