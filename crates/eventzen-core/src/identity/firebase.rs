//! Firebase Identity Toolkit gateway (REST `v1`).
//!
//! - Email/password: `accounts:signInWithPassword`.
//! - Federated: `accounts:createAuthUri` → browser → local redirect →
//!   `accounts:signInWithIdp`.
//! - Sign-out drops the tokens held for the current session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::callback::{CallbackListener, Redirect};
use super::{FederatedProvider, IdentityGateway, SessionUser, SignInMethod};
use crate::config::Config;
use crate::shared::{build_http_client, missing_api_key_message, resolve_api_key, resolve_base_url};

/// Default base URL for the Identity Toolkit API.
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

const API_KEY_ENV: &str = "FIREBASE_API_KEY";
const BASE_URL_ENV: &str = "FIREBASE_AUTH_BASE_URL";
const PASSWORD_PROVIDER_ID: &str = "password";

/// Opens the provider's consent page. Replaceable so the flow can run without
/// a desktop browser.
pub type BrowserLauncher = Arc<dyn Fn(&str) -> Result<()> + Send + Sync>;

fn system_browser() -> BrowserLauncher {
    Arc::new(|url: &str| open::that(url).context("Failed to open browser"))
}

/// Runtime config for the Firebase gateway.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub callback_port: u16,
    pub callback_timeout: Duration,
}

impl FirebaseConfig {
    /// Resolves identity settings.
    ///
    /// API key: `[identity] api_key`, then `FIREBASE_API_KEY`.
    /// Base URL: `FIREBASE_AUTH_BASE_URL`, then `[identity] base_url`, then the default.
    ///
    /// # Errors
    /// Returns an error if a configured base URL is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: resolve_base_url(
                config.identity.base_url.as_deref(),
                BASE_URL_ENV,
                DEFAULT_BASE_URL,
                "identity",
            )?,
            api_key: resolve_api_key(config.identity.api_key.as_deref(), API_KEY_ENV),
            callback_port: config.identity.callback_port,
            callback_timeout: config.identity.callback_timeout(),
        })
    }
}

#[derive(Debug, Clone)]
struct SessionTokens {
    id_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriRequest<'a> {
    provider_id: &'a str,
    continue_uri: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    auth_uri: String,
    session_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    request_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_body: Option<&'a str>,
    session_id: &'a str,
    return_secure_token: bool,
}

/// User record returned by both sign-in endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Maps Identity Toolkit error codes to user-facing text.
fn describe_error_code(code: &str) -> String {
    // Codes may carry detail after " : ", e.g. "WEAK_PASSWORD : Password should be..."
    let key = code.split(" : ").next().unwrap_or(code).trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password.".to_string()
        }
        "INVALID_EMAIL" => "That email address is not valid.".to_string(),
        "MISSING_PASSWORD" => "Enter a password.".to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Try again later.".to_string(),
        "OPERATION_NOT_ALLOWED" => "This sign-in method is not enabled.".to_string(),
        _ if key.is_empty() => "Sign-in failed.".to_string(),
        _ => format!("Sign-in failed: {key}"),
    }
}

/// Identity gateway backed by the Firebase Identity Toolkit REST API.
pub struct FirebaseGateway {
    config: FirebaseConfig,
    http: reqwest::Client,
    browser: BrowserLauncher,
    session: Mutex<Option<SessionTokens>>,
}

impl fmt::Debug for FirebaseGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseGateway")
            .field("base_url", &self.config.base_url)
            .field("callback_port", &self.config.callback_port)
            .finish_non_exhaustive()
    }
}

impl FirebaseGateway {
    pub fn new(config: FirebaseConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            browser: system_browser(),
            session: Mutex::new(None),
        }
    }

    /// Builds a gateway from the app config.
    ///
    /// # Errors
    /// Returns an error if the settings are invalid or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            FirebaseConfig::from_config(config)?,
            build_http_client(config.http_timeout())?,
        ))
    }

    /// Replaces the browser launcher used for federated sign-in.
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserLauncher) -> Self {
        self.browser = browser;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!(missing_api_key_message(API_KEY_ENV, "identity")))
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/accounts:{method}", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await
            .with_context(|| format!("Identity request {method} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_default();
            debug!(%status, method, code = %code, "identity request rejected");
            anyhow::bail!(describe_error_code(&code));
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {method} response"))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.post(
            "signInWithPassword",
            &PasswordRequest {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    async fn sign_in_with_provider(&self, provider: FederatedProvider) -> Result<UserRecord> {
        // Fail on a missing key before binding a port or opening a browser.
        self.api_key()?;

        let listener = CallbackListener::bind(self.config.callback_port)
            .await?
            .with_timeout(self.config.callback_timeout);
        let continue_uri = listener.redirect_uri();

        let auth: CreateAuthUriResponse = self
            .post(
                "createAuthUri",
                &CreateAuthUriRequest {
                    provider_id: provider.provider_id(),
                    continue_uri: &continue_uri,
                },
            )
            .await?;

        info!(
            provider = provider.provider_id(),
            url = %auth.auth_uri,
            "waiting for browser sign-in"
        );
        (self.browser)(&auth.auth_uri)?;

        let Redirect {
            request_uri,
            post_body,
        } = listener.wait_for_redirect().await?;

        self.post(
            "signInWithIdp",
            &IdpRequest {
                request_uri: &request_uri,
                post_body: post_body.as_deref(),
                session_id: &auth.session_id,
                return_secure_token: true,
            },
        )
        .await
    }
}

impl IdentityGateway for FirebaseGateway {
    async fn sign_in(&self, method: SignInMethod) -> Result<SessionUser> {
        let record = match &method {
            SignInMethod::EmailPassword { email, password } => {
                self.sign_in_with_password(email, password).await?
            }
            SignInMethod::Federated(provider) => self.sign_in_with_provider(*provider).await?,
        };

        let provider = record.provider_id.clone().unwrap_or_else(|| match &method {
            SignInMethod::Federated(provider) => provider.provider_id().to_string(),
            SignInMethod::EmailPassword { .. } => PASSWORD_PROVIDER_ID.to_string(),
        });

        if let (Some(id_token), Some(refresh_token)) = (record.id_token, record.refresh_token) {
            *self.session.lock().await = Some(SessionTokens {
                id_token,
                refresh_token,
            });
        }

        info!(uid = %record.local_id, provider = %provider, "signed in");
        Ok(SessionUser {
            uid: record.local_id,
            email: record.email,
            display_name: record.display_name,
            provider,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(tokens) = self.session.lock().await.take() {
            debug!(
                id_token_len = tokens.id_token.len(),
                refresh_token_len = tokens.refresh_token.len(),
                "dropped session tokens"
            );
        }
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn gateway(server: &MockServer) -> FirebaseGateway {
        FirebaseGateway::new(
            FirebaseConfig {
                base_url: server.uri(),
                api_key: Some("fb-key".into()),
                callback_port: 0,
                callback_timeout: Duration::from_secs(5),
            },
            build_http_client(Duration::from_secs(5)).unwrap(),
        )
    }

    fn password(email: &str, password: &str) -> SignInMethod {
        SignInMethod::EmailPassword {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_password_sign_in_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "fb-key"))
            .and(body_partial_json(serde_json::json!({
                "email": "ada@example.com",
                "password": "hunter2",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid-42",
                "email": "ada@example.com",
                "displayName": "Ada",
                "idToken": "id-token",
                "refreshToken": "refresh-token",
                "expiresIn": "3600",
                "registered": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server);
        let user = gateway
            .sign_in(password("ada@example.com", "hunter2"))
            .await
            .unwrap();

        assert_eq!(user.uid, "uid-42");
        assert_eq!(user.label(), "Ada");
        assert_eq!(user.provider, "password");
        assert!(gateway.session.lock().await.is_some());

        gateway.sign_out().await.unwrap();
        assert!(!gateway.session.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_password_sign_in_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS", "errors": []}
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server);
        let err = gateway
            .sign_in(password("ada@example.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid email or password.");
        assert!(!gateway.session.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gateway = FirebaseGateway::new(
            FirebaseConfig {
                base_url: server.uri(),
                api_key: None,
                callback_port: 0,
                callback_timeout: Duration::from_secs(5),
            },
            build_http_client(Duration::from_secs(5)).unwrap(),
        );
        let err = gateway
            .sign_in(SignInMethod::Federated(FederatedProvider::Google))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("FIREBASE_API_KEY"));
    }

    #[tokio::test]
    async fn test_federated_sign_in_round_trip() {
        let server = MockServer::start().await;

        // The consent page "redirects" straight back to the continue URI.
        Mock::given(method("POST"))
            .and(path("/v1/accounts:createAuthUri"))
            .and(body_partial_json(serde_json::json!({"providerId": "google.com"})))
            .respond_with(|req: &wiremock::Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                let continue_uri = body["continueUri"].as_str().unwrap().to_string();
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "authUri": format!("{continue_uri}?code=provider-code"),
                    "sessionId": "session-1",
                    "providerId": "google.com"
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithIdp"))
            .and(body_partial_json(serde_json::json!({
                "sessionId": "session-1",
                "returnSecureToken": true
            })))
            .respond_with(|req: &wiremock::Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                let request_uri = body["requestUri"].as_str().unwrap_or_default();
                assert!(request_uri.ends_with("/callback?code=provider-code"));
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "localId": "uid-g",
                    "email": "grace@example.com",
                    "displayName": "Grace",
                    "providerId": "google.com",
                    "idToken": "id",
                    "refreshToken": "refresh"
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        // Stand-in browser: follow the auth URI like a provider redirect would.
        let browser: BrowserLauncher = Arc::new(|url: &str| {
            let url = url.to_string();
            tokio::spawn(async move {
                let _ = reqwest::get(url).await;
            });
            Ok(())
        });

        let gateway = gateway(&server).with_browser(browser);
        let user = gateway
            .sign_in(SignInMethod::Federated(FederatedProvider::Google))
            .await
            .unwrap();

        assert_eq!(user.uid, "uid-g");
        assert_eq!(user.provider, "google.com");
        assert_eq!(user.label(), "Grace");
    }

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(describe_error_code("EMAIL_NOT_FOUND"), "Invalid email or password.");
        assert_eq!(
            describe_error_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            "Sign-in failed: WEAK_PASSWORD"
        );
        assert_eq!(describe_error_code(""), "Sign-in failed.");
    }
}
