//! FMCSA carrier registry client.
//!
//! One outbound lookup per verification, bounded by a request timeout. No
//! retries and no caching: every call re-queries the registry, and a slow or
//! unreachable upstream surfaces as `VerifyError::UpstreamUnavailable` rather
//! than a partial record.

use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::types::{CarrierRecord, CarrierStatus, FmcsaResponse};

const FMCSA_API_BASE: &str = "https://mobile.fmcsa.dot.gov/qc/services";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum VerifyError {
    /// MC number failed local validation; no outbound call was made
    #[error("invalid MC number: {0}")]
    InvalidInput(String),
    /// Registry unreachable, timed out, or returned something unusable
    #[error("FMCSA registry unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Configuration for [`FmcsaClient`]
#[derive(Debug, Clone)]
pub struct FmcsaConfig {
    /// FMCSA web key, passed as the `webKey` query parameter
    pub web_key: String,
    /// Registry base URL; overridable for tests
    pub base_url: String,
    /// Per-request timeout for the outbound lookup
    pub timeout: Duration,
}

impl FmcsaConfig {
    pub fn new(web_key: impl Into<String>) -> Self {
        Self {
            web_key: web_key.into(),
            base_url: FMCSA_API_BASE.to_string(),
            timeout: UPSTREAM_TIMEOUT,
        }
    }
}

/// HTTP client for carrier eligibility lookups
#[derive(Debug, Clone)]
pub struct FmcsaClient {
    http: reqwest::Client,
    web_key: String,
    base_url: String,
}

impl FmcsaClient {
    pub fn new(web_key: impl Into<String>) -> Result<Self> {
        Self::with_config(FmcsaConfig::new(web_key))
    }

    pub fn with_config(config: FmcsaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build FMCSA HTTP client")?;
        Ok(Self {
            http,
            web_key: config.web_key,
            base_url: config.base_url,
        })
    }

    /// Look up a carrier by MC number and return a normalized verdict.
    ///
    /// Absence from the registry comes back as a `NOT_FOUND` record, not an
    /// error; only input validation and upstream failures are `Err`.
    pub async fn verify(&self, mc_number: &str) -> Result<CarrierRecord, VerifyError> {
        let mc = validate_mc_number(mc_number)?;

        let url = format!("{}/carriers/{}", self.base_url, mc);
        tracing::debug!("FMCSA lookup: {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("webKey", self.web_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerifyError::UpstreamUnavailable("request timed out".to_string())
                } else {
                    VerifyError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(CarrierRecord::not_found(mc));
        }
        if !status.is_success() {
            // Includes 401 on a bad web key; the caller cannot fix that
            return Err(VerifyError::UpstreamUnavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        let body: FmcsaResponse = response.json().await.map_err(|e| {
            VerifyError::UpstreamUnavailable(format!("malformed response: {}", e))
        })?;

        let carrier = match body.content.and_then(|c| c.carrier) {
            Some(carrier) => carrier,
            None => return Ok(CarrierRecord::not_found(mc)),
        };

        let status = if carrier.is_eligible() {
            CarrierStatus::Eligible
        } else {
            CarrierStatus::Ineligible
        };
        let message = match status {
            CarrierStatus::Eligible => "Carrier is eligible to operate",
            _ => "Carrier is not eligible to operate",
        };

        Ok(CarrierRecord {
            mc_number: mc.to_string(),
            status,
            company_name: carrier.display_name(),
            safety_rating: carrier.safety_rating.clone(),
            operating_status: Some(carrier.operating_status().to_string()),
            message: message.to_string(),
        })
    }
}

/// An MC number must be a nonzero unsigned integer in decimal form.
///
/// Runs before any outbound call so garbage input never reaches the registry.
fn validate_mc_number(mc_number: &str) -> Result<&str, VerifyError> {
    let mc = mc_number.trim();
    let valid = !mc.is_empty()
        && mc.bytes().all(|b| b.is_ascii_digit())
        && mc.parse::<u64>().map(|n| n > 0).unwrap_or(false);
    if !valid {
        return Err(VerifyError::InvalidInput(format!(
            "'{}' is not a valid MC number",
            mc_number
        )));
    }
    Ok(mc)
}
