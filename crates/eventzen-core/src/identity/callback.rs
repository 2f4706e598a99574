//! One-shot local HTTP listener for the federated sign-in redirect.
//!
//! The provider redirects the browser to `http://127.0.0.1:<port>/callback`.
//! The listener answers that single request with a small page and hands the
//! full redirect (URL plus form body for `form_post` providers) back to the
//! gateway.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

/// Path the provider redirects to.
pub const CALLBACK_PATH: &str = "/callback";

/// Default limit on the whole wait for the browser.
pub const DEFAULT_REDIRECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Limit on reading one request. Browsers open idle pre-connections.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_REQUEST_BYTES: usize = 64 * 1024;

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h3>EventZen sign-in complete.</h3><p>You can close this window.</p>\
</body></html>";

/// Redirect captured by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Absolute URL the browser requested (query included for GET redirects).
    pub request_uri: String,
    /// Form body for providers that redirect with `POST`.
    pub post_body: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
struct RequestHead<'a> {
    method: &'a str,
    target: &'a str,
    content_length: usize,
}

fn parse_request_head(head: &str) -> Option<RequestHead<'_>> {
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?;
    let target = request_line.next()?;
    request_line.next()?.strip_prefix("HTTP/")?;

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0);

    Some(RequestHead {
        method,
        target,
        content_length,
    })
}

/// Resolves a request target against the listener origin.
fn callback_url(port: u16, target: &str) -> Option<Url> {
    Url::parse(&format!("http://127.0.0.1:{port}"))
        .ok()?
        .join(target)
        .ok()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn read_request(stream: &mut TcpStream) -> Result<(String, Option<String>)> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.context("read callback request")?;
        if n == 0 {
            anyhow::bail!("connection closed before request head");
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            anyhow::bail!("callback request head too large");
        }
    };

    let head_text = std::str::from_utf8(&buf[..header_end])
        .context("callback request head is not UTF-8")?
        .to_string();
    let head = parse_request_head(&head_text).context("malformed callback request")?;

    let body_start = header_end + 4;
    let body_end = body_start + head.content_length.min(MAX_REQUEST_BYTES);
    while buf.len() < body_end {
        let n = stream.read(&mut chunk).await.context("read callback body")?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = (head.content_length > 0 && head.method.eq_ignore_ascii_case("POST"))
        .then(|| String::from_utf8_lossy(&buf[body_start..body_end.min(buf.len())]).into_owned());

    Ok((head.target.to_string(), body))
}

async fn write_response(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(err) = stream.write_all(response.as_bytes()).await {
        debug!("failed to write callback response: {err}");
    }
    let _ = stream.shutdown().await;
}

/// Serves one accepted connection. Returns the redirect if this was the callback.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, port: u16) -> Option<Redirect> {
    let (target, post_body) =
        match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(err)) => {
                debug!(%peer, "ignoring bad callback request: {err:#}");
                return None;
            }
            Err(_elapsed) => {
                debug!(%peer, "dropping idle callback connection");
                return None;
            }
        };

    let Some(url) = callback_url(port, &target) else {
        write_response(&mut stream, "400 Bad Request", "Bad request").await;
        return None;
    };
    if url.path() != CALLBACK_PATH {
        write_response(&mut stream, "404 Not Found", "Not found").await;
        return None;
    }

    write_response(&mut stream, "200 OK", SUCCESS_PAGE).await;
    Some(Redirect {
        request_uri: url.into(),
        post_body,
    })
}

/// Listener bound to `127.0.0.1` for the duration of one sign-in.
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
    timeout: Duration,
}

impl CallbackListener {
    /// Binds the listener (`port` 0 picks a free port).
    ///
    /// # Errors
    /// Returns an error if the port cannot be bound.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("Failed to bind sign-in callback port {port}"))?;
        let port = listener
            .local_addr()
            .context("Failed to read callback listener address")?
            .port();
        Ok(Self {
            listener,
            port,
            timeout: DEFAULT_REDIRECT_TIMEOUT,
        })
    }

    /// Sets how long `wait_for_redirect` waits before giving up.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL the provider should redirect to.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.port)
    }

    /// Waits for the provider redirect. Requests for other paths (favicon etc.)
    /// get a 404 and are ignored. Connections are served concurrently.
    ///
    /// # Errors
    /// Returns an error if accepting connections fails or the wait times out.
    pub async fn wait_for_redirect(self) -> Result<Redirect> {
        let limit = self.timeout;
        match tokio::time::timeout(limit, self.serve()).await {
            Ok(result) => result,
            Err(_elapsed) => anyhow::bail!(
                "Timed out after {}s waiting for the browser sign-in",
                limit.as_secs()
            ),
        }
    }

    async fn serve(self) -> Result<Redirect> {
        let (tx, mut rx) = mpsc::channel::<Redirect>(1);
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.context("Failed to accept sign-in callback")?;
                    let tx = tx.clone();
                    let port = self.port;
                    tokio::spawn(async move {
                        if let Some(redirect) = handle_connection(stream, peer, port).await {
                            let _ = tx.send(redirect).await;
                        }
                    });
                }
                Some(redirect) = rx.recv() => return Ok(redirect),
            }
        }
    }
}
