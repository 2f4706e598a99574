//! Login command handler.

use anyhow::{Context, Result};
use eventzen_core::config::Config;
use eventzen_core::identity::{FederatedProvider, FirebaseGateway, IdentityGateway, SignInMethod};

/// Env var holding the password for `login --email`. Never taken from argv.
pub const PASSWORD_ENV: &str = "EVENTZEN_PASSWORD";

/// Picks the sign-in method from the `login` flags.
///
/// # Errors
/// Fails when no method is selected, or `--email` is given without a password.
pub fn method_from_flags(
    google: bool,
    apple: bool,
    email: Option<String>,
    password: Option<String>,
) -> Result<SignInMethod> {
    match (google, apple, email) {
        (true, false, None) => Ok(SignInMethod::Federated(FederatedProvider::Google)),
        (false, true, None) => Ok(SignInMethod::Federated(FederatedProvider::Apple)),
        (false, false, Some(email)) => {
            let email = email.trim().to_string();
            let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                anyhow::anyhow!("Set {PASSWORD_ENV} to sign in with --email")
            })?;
            if email.is_empty() {
                anyhow::bail!("Enter your email and password.");
            }
            Ok(SignInMethod::EmailPassword { email, password })
        }
        _ => anyhow::bail!("Please specify a sign-in method: --google, --apple, or --email"),
    }
}

pub async fn run(config: &Config, method: SignInMethod) -> Result<()> {
    let gateway = FirebaseGateway::from_config(config)?;

    if let SignInMethod::Federated(provider) = &method {
        eprintln!(
            "Opening the {} sign-in page in your browser...",
            provider.display_name()
        );
    }

    let label = method.label();
    let user = gateway
        .sign_in(method)
        .await
        .with_context(|| format!("{label} sign-in failed"))?;

    println!("Signed in as {} ({})", user.label(), user.provider);
    Ok(())
}
