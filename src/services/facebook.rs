//! Facebook Graph API client
//!
//! The HTTP side of the OAuth flow: exchanging the short-lived token the
//! client posts for a long-lived one, fetching the profile fields and
//! picture with it, and revoking the grant at logout. The Graph base URL is
//! configurable so tests can point it at a local server.

use crate::config::FacebookConfig;
use serde::Deserialize;

/// Error types for Graph API operations
#[derive(Debug, thiserror::Error)]
pub enum FacebookError {
    /// The token exchange was refused
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    /// The profile fetch was refused
    #[error("Profile fetch failed: {0}")]
    ProfileFailed(String),

    /// The profile carried no email address, so no local account can be
    /// matched or created
    #[error("OAuth profile has no email address")]
    MissingEmail,

    /// The revoke call was refused
    #[error("Revoke failed: {0}")]
    RevokeFailed(String),

    /// Transport-level error
    #[error("Graph API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Profile fields fetched after the token exchange
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookProfile {
    /// Provider user id
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
    name: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PictureResponse {
    data: PictureData,
}

#[derive(Debug, Deserialize)]
struct PictureData {
    url: String,
}

/// Facebook Graph API client
pub struct FacebookClient {
    client: reqwest::Client,
    config: FacebookConfig,
}

impl FacebookClient {
    /// Create a client for the configured OAuth application
    pub fn new(config: FacebookConfig) -> Result<Self, FacebookError> {
        let client = reqwest::Client::builder()
            .user_agent("minilog")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    /// The OAuth application id
    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    /// Exchange the client's short-lived access token for a long-lived one
    pub async fn exchange_token(&self, short_lived_token: &str) -> Result<String, FacebookError> {
        let url = format!(
            "{}/oauth/access_token?grant_type=fb_exchange_token&client_id={}&client_secret={}&fb_exchange_token={}",
            self.config.graph_url,
            urlencoding::encode(&self.config.app_id),
            urlencoding::encode(&self.config.app_secret),
            urlencoding::encode(short_lived_token),
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FacebookError::ExchangeFailed(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FacebookError::ExchangeFailed(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Fetch the profile fields (id, name, email) with the exchanged token
    pub async fn fetch_profile(&self, access_token: &str) -> Result<FacebookProfile, FacebookError> {
        let url = format!(
            "{}/me?access_token={}&fields=name,id,email",
            self.config.graph_url,
            urlencoding::encode(access_token),
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FacebookError::ProfileFailed(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let profile: ProfileResponse = response
            .json()
            .await
            .map_err(|e| FacebookError::ProfileFailed(e.to_string()))?;

        let email = profile.email.ok_or(FacebookError::MissingEmail)?;

        Ok(FacebookProfile {
            id: profile.id,
            name: profile.name,
            email,
        })
    }

    /// Fetch the profile picture URL with the exchanged token
    pub async fn fetch_picture_url(&self, access_token: &str) -> Result<String, FacebookError> {
        let url = format!(
            "{}/me/picture?access_token={}&redirect=0&height=200&width=200",
            self.config.graph_url,
            urlencoding::encode(access_token),
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FacebookError::ProfileFailed(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let picture: PictureResponse = response
            .json()
            .await
            .map_err(|e| FacebookError::ProfileFailed(e.to_string()))?;

        Ok(picture.data.url)
    }

    /// Revoke the grant at the provider, called during logout of an
    /// OAuth-established session
    pub async fn revoke(
        &self,
        provider_user_id: &str,
        access_token: &str,
    ) -> Result<(), FacebookError> {
        let url = format!(
            "{}/{}/permissions?access_token={}",
            self.config.graph_url,
            urlencoding::encode(provider_user_id),
            urlencoding::encode(access_token),
        );

        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(FacebookError::RevokeFailed(format!(
                "provider answered {}",
                response.status()
            )));
        }

        Ok(())
    }
}
