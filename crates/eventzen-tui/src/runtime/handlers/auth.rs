use eventzen_core::identity::{IdentityGateway, SignInMethod};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::UiEvent;

/// Signs in through the gateway. The attempt is abandoned when `cancel`
/// fires (the dialog was closed while waiting on the browser).
pub async fn sign_in<I>(gateway: &I, method: SignInMethod, cancel: Option<CancellationToken>) -> UiEvent
where
    I: IdentityGateway + Sync,
{
    let label = method.label();
    let attempt = gateway.sign_in(method);

    let result = match cancel {
        Some(cancel) => {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(method = label, "sign-in cancelled");
                    return UiEvent::SignInFinished {
                        method: label,
                        result: Err("Sign-in cancelled.".to_string()),
                    };
                }
                result = attempt => result,
            }
        }
        None => attempt.await,
    };

    UiEvent::SignInFinished {
        method: label,
        result: result.map_err(|err| {
            debug!(method = label, "sign-in failed: {err:#}");
            err.to_string()
        }),
    }
}

pub async fn sign_out<I>(gateway: &I) -> UiEvent
where
    I: IdentityGateway + Sync,
{
    UiEvent::SignedOut(gateway.sign_out().await.map_err(|err| format!("{err:#}")))
}
