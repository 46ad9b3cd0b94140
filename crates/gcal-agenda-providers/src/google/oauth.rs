//! OAuth 2.0 authorization-code flow with PKCE for installed apps.
//!
//! The user's browser is sent to Google's consent page with a SHA-256 code
//! challenge. Google redirects back to a listener on `127.0.0.1`, and the
//! code from that redirect is exchanged (with the verifier) for tokens.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Random bytes behind the code verifier (43 characters once encoded).
const CODE_VERIFIER_BYTES: usize = 32;

/// How long the user has to finish the consent screen.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// Talks to Google's OAuth endpoints.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(credentials: OAuthCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
        }
    }

    /// Runs the interactive consent flow and returns fresh tokens.
    ///
    /// # Errors
    ///
    /// Fails when no loopback port in `port_range` is free, the user denies
    /// access, the callback does not arrive in time, or the code exchange is
    /// rejected.
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();
        let (listener, port) = bind_loopback(port_range).await?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let auth_url = pkce.build_auth_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!("opening browser for Google authorization");
        debug!("authorization URL: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nOpen this URL in your browser to authorize gcal-agenda:\n\n{}\n", auth_url);
        }

        let callback = tokio::time::timeout(CALLBACK_TIMEOUT, accept_callback(&listener))
            .await
            .map_err(|_| ProviderError::authentication("timed out waiting for authorization"))??;

        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch in authorization callback",
            ));
        }

        debug!("received authorization code, exchanging for tokens");
        let response = self
            .token_request(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", callback.code.as_str()),
                ("code_verifier", pkce.verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;

        info!("authorization complete");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Returns the access token and its lifetime in seconds.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<(String, Option<i64>)> {
        let response = self
            .token_request(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        debug!("refreshed access token");
        Ok((response.access_token, response.expires_in))
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network("token request failed").with_source(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network("failed to read token response").with_source(e))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("malformed token response").with_source(e)
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

async fn bind_loopback(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await {
            debug!("listening for OAuth redirect on port {}", port);
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no free loopback port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Accepts connections until one carries the OAuth redirect.
async fn accept_callback(listener: &TcpListener) -> ProviderResult<Callback> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| ProviderError::internal("loopback accept failed").with_source(e))?;
        if let Some(outcome) = serve_callback(stream).await {
            return outcome;
        }
    }
}

/// Reads one request and answers it. Returns `None` for requests that are not
/// the redirect, such as a browser asking for `/favicon.ico`.
async fn serve_callback(mut stream: TcpStream) -> Option<ProviderResult<Callback>> {
    let mut request_line = String::new();
    BufReader::new(&mut stream)
        .read_line(&mut request_line)
        .await
        .ok()?;

    let outcome = parse_callback(&request_line)?;
    let (status, message) = match &outcome {
        Ok(_) => ("200 OK", "Authorization complete. You can close this window."),
        Err(_) => ("400 Bad Request", "Authorization failed. You can close this window."),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nConnection: close\r\n\r\n\
         <html><body><p>{message}</p></body></html>"
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("failed to answer browser: {}", e);
    }
    Some(outcome)
}

/// Code and state carried by the redirect.
#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

/// Parses a request line like `GET /callback?code=..&state=.. HTTP/1.1`.
fn parse_callback(request_line: &str) -> Option<ProviderResult<Callback>> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => error = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {}",
            error
        ))));
    }
    Some(match code {
        Some(code) => Ok(Callback {
            code,
            state: state.unwrap_or_default(),
        }),
        None => Err(ProviderError::authentication(
            "authorization callback carried no code",
        )),
    })
}

/// PKCE verifier, challenge and anti-forgery state for one flow (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    /// Base64url SHA-256 of the verifier.
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_BYTES);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    /// Builds the consent page URL. Offline access is requested so a refresh
    /// token is issued.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let params = [
            ("client_id", client_id.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
            ("response_type", "code".to_string()),
            ("scope", scopes.join(" ")),
            ("code_challenge", self.challenge.clone()),
            ("code_challenge_method", "S256".to_string()),
            ("state", self.state.clone()),
            ("access_type", "offline".to_string()),
            ("prompt", "consent".to_string()),
        ];
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}?{}", GOOGLE_AUTH_URL, query.join("&"))
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn verifier_is_43_chars() {
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn challenge_matches_rfc7636_example() {
        // Appendix B of RFC 7636.
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn flows_are_random() {
        let a = PkceFlow::new();
        let b = PkceFlow::new();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn auth_url_carries_pkce_and_offline_access() {
        let flow = PkceFlow::new();
        let url = flow.build_auth_url(
            "id.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &["https://www.googleapis.com/auth/calendar.readonly".to_string()],
        );

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?client_id="));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
        assert!(url.contains(&format!("code_challenge={}", flow.challenge)));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fcalendar.readonly"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn parse_callback_with_code_and_state() {
        let callback = parse_callback("GET /callback?state=abc&code=4%2F0Ab HTTP/1.1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            callback,
            Callback {
                code: "4/0Ab".to_string(),
                state: "abc".to_string()
            }
        );
    }

    #[test]
    fn parse_callback_ignores_other_requests() {
        assert!(parse_callback("GET /favicon.ico HTTP/1.1").is_none());
        assert!(parse_callback("POST /callback?code=x HTTP/1.1").is_none());
        assert!(parse_callback("").is_none());
    }

    #[test]
    fn parse_callback_reports_denial() {
        let err = parse_callback("GET /callback?error=access_denied HTTP/1.1")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("access_denied"));

        let missing = parse_callback("GET /callback HTTP/1.1").unwrap();
        assert!(missing.is_err());
    }
}
