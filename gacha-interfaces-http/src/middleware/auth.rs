use std::io::Read;

use anyhow::{bail, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use gacha_domain::{PlayerId, PoolCategory, RuntimeConfig};

use crate::error::HttpError;

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Uploaded files may arrive gzip-compressed; everything else is passed through as-is.
/// Inflated output is capped at `limit` bytes, same as a plain body.
pub fn maybe_gunzip(headers: &HeaderMap, body: &[u8], limit: u64) -> Result<Vec<u8>> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("") == "gzip" {
            let mut decoder = GzDecoder::new(body).take(limit.saturating_add(1));
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            if out.len() as u64 > limit {
                bail!("inflated body exceeds {} bytes", limit);
            }
            return Ok(out);
        }
    }
    Ok(body.to_vec())
}

pub fn parse_player(raw: &str) -> Result<PlayerId, HttpError> {
    PlayerId::parse(raw).map_err(|err| HttpError::BadRequest(err.to_string()))
}

pub fn parse_category(raw: &str) -> Result<PoolCategory, HttpError> {
    raw.parse::<PoolCategory>().map_err(HttpError::BadRequest)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
