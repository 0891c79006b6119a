//! OAuth 2.0 for the Search Console API.
//!
//! Credentials live in two JSON files: the client secrets downloaded from
//! the Google Cloud console, and a token cache written on first login.
//! [`Authenticator::authenticate`] reuses the cached access token while it
//! is fresh, refreshes it when it has expired, and otherwise walks the user
//! through the consent screen.
//!
//! API clients hold a [`TokenProvider`] rather than a bare token so that
//! long runs pick up a new access token when the old one lapses.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{AppError, Result};

pub const SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN_SECS: i64 = 300;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// One OAuth client entry from `client_secrets.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientConfig {
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

/// `client_secrets.json`, for either an installed or a web application
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    installed: Option<ClientConfig>,
    web: Option<ClientConfig>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Auth(format!("cannot read client secrets {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn client(&self) -> Result<&ClientConfig> {
        self.installed
            .as_ref()
            .or(self.web.as_ref())
            .ok_or_else(|| AppError::Auth("client secrets hold no `installed` or `web` client".into()))
    }
}

/// Token cache persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Access token that is still good at `now`
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let expiry = self.expiry?;
        if expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now {
            return None;
        }
        self.token.as_deref()
    }

    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        self.expiry = response.expires_in.map(|secs| now + Duration::seconds(secs));
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Pull the authorization code out of whatever the user pasted: either the
/// bare code or the full redirect URL
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Consent screen URL for `client`
pub fn authorization_url(client: &ClientConfig) -> Result<Url> {
    Ok(Url::parse_with_params(
        &client.auth_uri,
        &[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", client.redirect_uri()),
            ("response_type", "code"),
            ("scope", SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )?)
}

/// Source of bearer tokens for API requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A token that should still be accepted
    async fn token(&self) -> Result<String>;

    /// A new token, after the server rejected the last one
    async fn renew(&self) -> Result<String>;
}

/// Fixed token that cannot be renewed
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn renew(&self) -> Result<String> {
        Err(AppError::Auth("static access token was rejected".into()))
    }
}

pub struct Authenticator {
    http: Client,
    client_secrets: PathBuf,
    credentials: PathBuf,
    open_browser: bool,
}

impl Authenticator {
    pub fn new(
        client_secrets: impl Into<PathBuf>,
        credentials: impl Into<PathBuf>,
        open_browser: bool,
    ) -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            client_secrets: client_secrets.into(),
            credentials: credentials.into(),
            open_browser,
        })
    }

    /// Return a usable access token, logging in or refreshing as needed
    pub async fn authenticate(&self) -> Result<String> {
        if self.credentials.is_file() {
            info!("{} found", self.credentials.display());
            let mut creds = StoredCredentials::load(&self.credentials)?;

            if let Some(token) = creds.valid_token(Utc::now()) {
                debug!("cached access token still valid");
                return Ok(token.to_string());
            }

            self.refresh(&mut creds).await?;
            creds.save(&self.credentials)?;
            return creds
                .token
                .ok_or_else(|| AppError::Auth("token endpoint returned no access token".into()));
        }

        info!("{} not found, starting consent flow", self.credentials.display());
        let creds = self.consent().await?;
        creds.save(&self.credentials)?;
        creds
            .token
            .ok_or_else(|| AppError::Auth("token endpoint returned no access token".into()))
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&self, creds: &mut StoredCredentials) -> Result<()> {
        let refresh_token = creds
            .refresh_token
            .clone()
            .ok_or_else(|| AppError::Auth("cached credentials have no refresh token".into()))?;

        let response = self
            .token_request(
                &creds.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", creds.client_id.as_str()),
                    ("client_secret", creds.client_secret.as_str()),
                ],
            )
            .await?;

        creds.apply(response, Utc::now());
        info!("access token refreshed");
        Ok(())
    }

    /// Refresh the cached credentials whatever their expiry says
    pub async fn force_refresh(&self) -> Result<String> {
        let mut creds = StoredCredentials::load(&self.credentials)?;
        self.refresh(&mut creds).await?;
        creds.save(&self.credentials)?;
        creds
            .token
            .ok_or_else(|| AppError::Auth("token endpoint returned no access token".into()))
    }

    async fn consent(&self) -> Result<StoredCredentials> {
        let secrets = ClientSecrets::load(&self.client_secrets)?;
        let client = secrets.client()?;
        let url = authorization_url(client)?;

        println!("Open this URL in your browser and approve access:\n\n{}\n", url);
        if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                warn!("Could not open browser: {}", e);
            }
        }
        println!("Paste the authorization code (or the full redirect URL):");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        let code = extract_code(&line)
            .ok_or_else(|| AppError::Auth("no authorization code entered".into()))?;

        self.exchange_code(client, &code).await
    }

    /// Trade an authorization code for tokens
    pub async fn exchange_code(&self, client: &ClientConfig, code: &str) -> Result<StoredCredentials> {
        let response = self
            .token_request(
                &client.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", client.client_id.as_str()),
                    ("client_secret", client.client_secret.as_str()),
                    ("redirect_uri", client.redirect_uri()),
                ],
            )
            .await?;

        let mut creds = StoredCredentials {
            token: None,
            refresh_token: None,
            token_uri: client.token_uri.clone(),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scopes: vec![SCOPE.to_string()],
            expiry: None,
        };
        creds.apply(response, Utc::now());
        Ok(creds)
    }

    async fn token_request(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self.http.post(token_uri).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "token request failed ({}): {}",
                status.as_u16(),
                body
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenProvider for Authenticator {
    async fn token(&self) -> Result<String> {
        self.authenticate().await
    }

    async fn renew(&self) -> Result<String> {
        warn!("access token rejected, refreshing");
        self.force_refresh().await
    }
}
