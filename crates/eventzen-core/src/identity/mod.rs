//! Identity gateway: federated and email/password sign-in, sign-out.
//!
//! The application only ever sees the `SessionUser` a successful sign-in
//! returns. Tokens stay inside the gateway implementation.

pub mod callback;
pub mod firebase;

use std::fmt;
use std::future::Future;

use anyhow::Result;

pub use firebase::{FirebaseConfig, FirebaseGateway};

/// Federated identity providers offered in the login dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FederatedProvider {
    Google,
    Apple,
}

impl FederatedProvider {
    /// Provider id understood by the identity gateway.
    pub fn provider_id(&self) -> &'static str {
        match self {
            FederatedProvider::Google => "google.com",
            FederatedProvider::Apple => "apple.com",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FederatedProvider::Google => "Google",
            FederatedProvider::Apple => "Apple",
        }
    }
}

/// How a sign-in attempt authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum SignInMethod {
    Federated(FederatedProvider),
    EmailPassword { email: String, password: String },
}

impl SignInMethod {
    /// Short label for logs and status text.
    pub fn label(&self) -> &'static str {
        match self {
            SignInMethod::Federated(provider) => provider.display_name(),
            SignInMethod::EmailPassword { .. } => "Email",
        }
    }
}

// Keeps passwords out of logs and panic messages.
impl fmt::Debug for SignInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignInMethod::Federated(provider) => f.debug_tuple("Federated").field(provider).finish(),
            SignInMethod::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Identity returned by the gateway after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Provider id (`password`, `google.com`, `apple.com`).
    pub provider: String,
}

impl SessionUser {
    /// Display name, falling back to email, then uid.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Hosted identity service.
pub trait IdentityGateway {
    fn sign_in(&self, method: SignInMethod) -> impl Future<Output = Result<SessionUser>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;
}
