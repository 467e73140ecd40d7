//! Identity exchange with an external OAuth provider.
//!
//! The backend only needs one capability from the provider: turn an
//! authorization code into a verified identity. [`IdentityProvider`] is that
//! seam; [`GoogleIdentityProvider`] implements it against Google's OpenID
//! Connect endpoints.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

use crate::constants::generate_login_state;
use crate::error::{Error, Result};

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// How long a login state value stays valid between redirect and callback
pub const LOGIN_STATE_TTL: Duration = Duration::from_secs(600);

/// Identity returned by a successful exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is redirected to in order to start a login
    fn authorize_url(&self, state: &str) -> Result<Url>;

    /// Exchange an authorization code for a verified identity.
    /// Every failure is reported as [`Error::AuthenticationFailure`].
    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity>;
}

/// Google OAuth endpoints; overridable so tests can point at a local server
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth: GOOGLE_AUTH_ENDPOINT.to_string(),
            token: GOOGLE_TOKEN_ENDPOINT.to_string(),
            userinfo: GOOGLE_USERINFO_ENDPOINT.to_string(),
        }
    }
}

pub struct GoogleIdentityProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::with_endpoints(client_id, client_secret, redirect_uri, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        endpoints: GoogleEndpoints,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            endpoints,
            http: reqwest::Client::new(),
        }
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(auth_failure)?;

        if !response.status().is_success() {
            return Err(Error::AuthenticationFailure(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(auth_failure)?;
        Ok(token.access_token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo> {
        let response = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(auth_failure)?;

        if !response.status().is_success() {
            return Err(Error::AuthenticationFailure(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        response.json().await.map_err(auth_failure)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoints.auth)
            .map_err(|e| Error::AuthenticationFailure(format!("invalid auth endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity> {
        let access_token = self.fetch_access_token(code).await?;
        let info = self.fetch_userinfo(&access_token).await?;
        identity_from_userinfo(info)
    }
}

fn identity_from_userinfo(info: GoogleUserInfo) -> Result<VerifiedIdentity> {
    let email = info
        .email
        .ok_or_else(|| Error::AuthenticationFailure("provider returned no email".to_string()))?;
    if info.email_verified == Some(false) {
        return Err(Error::AuthenticationFailure(format!(
            "email {} is not verified",
            email
        )));
    }
    Ok(VerifiedIdentity {
        external_id: info.sub,
        display_name: info.name.unwrap_or_else(|| email.clone()),
        email,
        avatar_url: info.picture,
    })
}

fn auth_failure(err: reqwest::Error) -> Error {
    warn!("Identity exchange failed: {}", err);
    Error::AuthenticationFailure(err.to_string())
}

/// Upper bound on login state values waiting for a callback
pub const MAX_PENDING_LOGIN_STATES: usize = 10_000;

/// Pending login state values issued at redirect time
#[derive(Debug)]
pub struct LoginStates {
    pending: DashMap<String, Instant>,
    capacity: usize,
}

impl Default for LoginStates {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_LOGIN_STATES)
    }
}

impl LoginStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold at most `capacity` pending values; the oldest is evicted first
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Issue a new state value and forget any that have expired
    pub fn issue(&self) -> String {
        self.pending
            .retain(|_, issued_at| issued_at.elapsed() < LOGIN_STATE_TTL);
        while self.pending.len() >= self.capacity {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting oldest pending login state");
                    self.pending.remove(&key);
                }
                None => break,
            }
        }
        let state = generate_login_state();
        self.pending.insert(state.clone(), Instant::now());
        state
    }

    /// Number of values currently waiting for a callback
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consume a state value. Each value is accepted at most once.
    pub fn consume(&self, state: &str) -> bool {
        match self.pending.remove(state) {
            Some((_, issued_at)) if issued_at.elapsed() < LOGIN_STATE_TTL => true,
            Some(_) => {
                debug!("Rejected expired login state");
                false
            }
            None => false,
        }
    }
}
