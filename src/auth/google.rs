//! Google OAuth2 provider: authorization URL, code exchange and userinfo.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GoogleConfig;

const SCOPES: &str =
    "https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile";

/// Profile fields fetched from the provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("userinfo request failed: {0}")]
    UserInfo(String),
    #[error("userinfo response could not be parsed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-screen URL carrying the given state value.
    fn authorize_url(&self, state: &str) -> String;
    /// Trades an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;
    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl IdentityProvider for GoogleClient {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let res = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %body, "token endpoint rejected code");
            return Err(ProviderError::Exchange(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;
        debug!("authorization code exchanged");
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, ProviderError> {
        let res = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ProviderError::UserInfo(format!(
                "userinfo endpoint returned {}",
                res.status()
            )));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;
        parse_profile(&body)
    }
}

fn parse_profile(body: &[u8]) -> Result<GoogleProfile, ProviderError> {
    let profile: GoogleProfile =
        serde_json::from_slice(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    if profile.id.is_empty() {
        return Err(ProviderError::Parse("missing id".into()));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn authorize_url_carries_state_and_offline_access() {
        let client = GoogleClient::new(AppConfig::for_tests().google).unwrap();
        let url = client.authorize_url("abc123");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"
        ));
    }

    #[test]
    fn parses_userinfo_payload() {
        let body = br#"{"id":"g1","name":"Jane Doe","email":"j@x.com","picture":"https://img","verified_email":true}"#;
        let profile = parse_profile(body).unwrap();
        assert_eq!(profile.id, "g1");
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.picture, "https://img");
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let profile = parse_profile(br#"{"id":"g2"}"#).unwrap();
        assert_eq!(profile.name, "");
        assert_eq!(profile.email, "");
    }

    #[test]
    fn rejects_garbage_and_missing_id() {
        assert!(matches!(parse_profile(b"<html>"), Err(ProviderError::Parse(_))));
        assert!(matches!(parse_profile(br#"{"name":"x"}"#), Err(ProviderError::Parse(_))));
    }
}
