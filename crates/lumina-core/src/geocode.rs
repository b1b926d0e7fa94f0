//! Postal code to coordinate lookup.

use std::sync::LazyLock;

use async_trait::async_trait;
use lumina_models::GeoPoint;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{CoreError, Result};

/// Zippopotam.us endpoint for US postal codes.
pub const ZIPPOPOTAM_BASE_URL: &str = "http://api.zippopotam.us/us/";

/// US ZIP or ZIP+4.
static POSTAL_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{5})(?:-\d{4})?$").expect("Invalid postal code regex"));

/// Validates a US postal code and returns its five-digit form.
pub fn normalize_postal_code(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    POSTAL_CODE_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CoreError::InvalidPostalCode(trimmed.to_string()))
}

/// Resolves postal codes to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns the coordinates of `postal_code` (already normalized).
    async fn locate(&self, postal_code: &str) -> Result<GeoPoint>;
}

#[derive(Debug, Deserialize)]
struct ZippopotamResponse {
    #[serde(default)]
    places: Vec<ZippopotamPlace>,
}

#[derive(Debug, Deserialize)]
struct ZippopotamPlace {
    latitude: String,
    longitude: String,
}

/// Parses a Zippopotam.us response body; coordinates come as strings.
pub fn parse_zippopotam(body: &str, postal_code: &str) -> Result<GeoPoint> {
    let response: ZippopotamResponse =
        serde_json::from_str(body).map_err(|e| CoreError::UnexpectedResponse {
            service: "zippopotam",
            detail: e.to_string(),
        })?;

    let place = response
        .places
        .first()
        .ok_or_else(|| CoreError::PostalCodeNotFound(postal_code.to_string()))?;

    match (
        place.latitude.trim().parse::<f64>(),
        place.longitude.trim().parse::<f64>(),
    ) {
        (Ok(lat), Ok(lon)) => Ok(GeoPoint::new(lat, lon)),
        _ => Err(CoreError::PostalCodeNotFound(postal_code.to_string())),
    }
}

/// Geocoder backed by the Zippopotam.us API.
pub struct ZippopotamGeocoder {
    client: reqwest::Client,
    base_url: Url,
}

impl ZippopotamGeocoder {
    pub fn new(client: reqwest::Client) -> Result<Self> {
        Self::with_base_url(client, ZIPPOPOTAM_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }
}

#[async_trait]
impl Geocoder for ZippopotamGeocoder {
    async fn locate(&self, postal_code: &str) -> Result<GeoPoint> {
        let code = normalize_postal_code(postal_code)?;
        let url = self.base_url.join(&code)?;
        debug!(url = %url, "Geocoding postal code");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::PostalCodeNotFound(code));
        }
        if !status.is_success() {
            return Err(CoreError::UnexpectedResponse {
                service: "zippopotam",
                detail: format!("status {}", status),
            });
        }

        let body = response.text().await?;
        parse_zippopotam(&body, &code)
    }
}
