use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::constants::{FEED_CONNECT_TIMEOUT_SECS, FEED_FETCH_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::models::Listing;
use crate::services::filter_normalizer::normalize_resource;

/// Client for the upstream MLS feed (RealtyFeed's OData API). Each fetch is
/// two sequential calls: a client-credentials token grant, then the data GET.
#[derive(Debug, Clone)]
pub struct RealtyFeedClient {
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl RealtyFeedClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.realtyfeed_api_url.clone(),
            token_url: config.realtyfeed_token_url.clone(),
            client_id: config.realtyfeed_client_id.clone(),
            client_secret: config.realtyfeed_client_secret.clone(),
            api_key: config.realtyfeed_api_key.clone(),
        }
    }

    /// Fetches an OData resource (`<path>?<query>`) from the feed with its
    /// `$filter` normalized, and returns the upstream JSON unmodified.
    pub async fn fetch_resource(&self, resource: &str) -> Result<Value> {
        if resource.trim().is_empty() {
            return Err(AppError::MissingParameter("resource"));
        }

        let token = self.acquire_token().await?;
        let url = join_feed_url(&self.api_url, &normalize_resource(resource));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(FEED_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(FEED_FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Internal(format!("RealtyFeed HTTP client init failed: {}", e))
            })?;

        let mut request = client.get(&url).bearer_auth(&token);
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.header("x-api-key", api_key.trim());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamFetch {
                    status: 504,
                    body: "RealtyFeed request timed out".to_string(),
                }
            } else {
                AppError::UpstreamFetch {
                    status: 502,
                    body: format!("RealtyFeed request failed: {}", e),
                }
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamFetch { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("RealtyFeed response parse failed: {}", e)))
    }

    /// Fetches a single listing by ListingKey, or None when the feed has no
    /// match.
    pub async fn get_listing(&self, listing_key: &str) -> Result<Option<Listing>> {
        let normalized = validate_listing_key(listing_key)?;
        let resource = format!(
            "Property?$filter=ListingKey eq '{}'&$top=1",
            normalized
        );

        let payload = self.fetch_resource(&resource).await?;
        let Some(first) = payload.get("value").and_then(|rows| rows.get(0)) else {
            return Ok(None);
        };

        let listing = serde_json::from_value::<Listing>(first.clone())
            .map_err(|e| AppError::Internal(format!("RealtyFeed listing parse failed: {}", e)))?;
        Ok(Some(listing))
    }

    // OAuth2 client-credentials grant against the identity provider.
    async fn acquire_token(&self) -> Result<String> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(FEED_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(FEED_FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Internal(format!("RealtyFeed HTTP client init failed: {}", e))
            })?;

        let response = client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamAuth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Token response parse failed: {}", e)))?;

        if token.access_token.trim().is_empty() {
            return Err(AppError::UpstreamAuth(
                "Token endpoint returned an empty access_token".to_string(),
            ));
        }

        Ok(token.access_token)
    }
}

fn join_feed_url(base: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}

// Listing keys land inside an OData string literal and a URL path; reject the
// characters that would break out of either.
fn validate_listing_key(raw: &str) -> Result<&str> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        return Err(AppError::MissingParameter("listing_key"));
    }
    if normalized.contains(['\'', '/', '?', '&']) {
        return Err(AppError::BadRequest(
            "listing_key contains invalid characters".to_string(),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_join_collapses_slashes() {
        assert_eq!(
            join_feed_url("https://api.example/reso/", "/Property?$top=1"),
            "https://api.example/reso/Property?$top=1"
        );
        assert_eq!(
            join_feed_url("https://api.example/reso", "Property"),
            "https://api.example/reso/Property"
        );
    }

    #[test]
    fn listing_keys_with_breakout_characters_are_rejected() {
        assert!(validate_listing_key("MDBC2012345").is_ok());
        assert!(validate_listing_key("  MDBC2012345 ").is_ok());
        assert!(validate_listing_key("").is_err());
        assert!(validate_listing_key("X' or ListPrice gt 0").is_err());
        assert!(validate_listing_key("a/b").is_err());
    }
}
