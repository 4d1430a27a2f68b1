// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Token acquisition against the Keycloak realm that fronts an omnikeeper
//! server, using the OAuth2 resource owner password grant.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Error;

/// Tokens within this duration of expiring are treated as already expired.
const EXPIRES_LEEWAY: Duration = Duration::from_secs(20);

const DEFAULT_CLIENT_ID: &str = "omnikeeper";

/// A bearer token issued by the identity provider.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub scope: Option<String>,
    pub expiry: Instant,
    pub refresh_expiry: Option<Instant>,
}

impl Token {
    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRES_LEEWAY >= self.expiry
    }

    fn can_refresh(&self) -> bool {
        if self.refresh_token.is_none() {
            return false;
        }
        match self.refresh_expiry {
            Some(refresh_expiry) => Instant::now() + EXPIRES_LEEWAY < refresh_expiry,
            None => true,
        }
    }
}

/// Wire format of the Keycloak token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    token_type: String,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_token(self, fetched_at: Instant) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            scope: self.scope,
            expiry: fetched_at + Duration::from_secs(self.expires_in),
            refresh_expiry: self
                .refresh_expires_in
                .map(|secs| fetched_at + Duration::from_secs(secs)),
        }
    }
}

/// Fetches and caches bearer tokens for a single set of user credentials.
///
/// `token()` hands out the cached token until it nears expiry, then renews it
/// through the refresh grant where possible, falling back to a full password
/// grant otherwise.
pub struct TokenManager {
    authority: String,
    username: String,
    password: String,
    client_id: String,
    cached: RwLock<Option<Token>>,
}

impl TokenManager {
    /// `authority` is the realm base URL, e.g.
    /// `https://auth.example.com/auth/realms/omnikeeper`.
    pub fn new(authority: &str, username: &str, password: &str, client_id: &str) -> Self {
        Self {
            authority: authority.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            client_id: client_id.to_string(),
            cached: RwLock::new(None),
        }
    }

    /// Builds a manager from OMNIKEEPER_AUTHORITY, OMNIKEEPER_USERNAME,
    /// OMNIKEEPER_PASSWORD and optionally OMNIKEEPER_CLIENT_ID.
    pub fn from_env() -> Result<Self, Error> {
        let authority = require_env("OMNIKEEPER_AUTHORITY")?;
        let username = require_env("OMNIKEEPER_USERNAME")?;
        let password = require_env("OMNIKEEPER_PASSWORD")?;
        let client_id =
            std::env::var("OMNIKEEPER_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string());
        Ok(Self::new(&authority, &username, &password, &client_id))
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Returns a token that is valid for at least the expiry leeway.
    pub fn token(&self) -> Result<Token, Error> {
        {
            let guard = self.cached.read().unwrap();
            if let Some(token) = guard.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let mut guard = self.cached.write().unwrap();

        // another caller may have renewed while we waited for the write lock
        if let Some(token) = guard.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let token = match self.try_refresh(guard.as_ref()) {
            Some(token) => token,
            None => self.password_grant()?,
        };

        *guard = Some(token.clone());
        Ok(token)
    }

    fn try_refresh(&self, current: Option<&Token>) -> Option<Token> {
        let current = current.filter(|t| t.can_refresh())?;
        let refresh_token = current.refresh_token.as_deref()?;

        match self.refresh_grant(refresh_token) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!("Token refresh failed, falling back to password grant: {}", err);
                None
            }
        }
    }

    fn password_grant(&self) -> Result<Token, Error> {
        self.request_token(&[
            ("grant_type", "password"),
            ("client_id", &self.client_id),
            ("username", &self.username),
            ("password", &self.password),
        ])
    }

    fn refresh_grant(&self, refresh_token: &str) -> Result<Token, Error> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("refresh_token", refresh_token),
        ])
    }

    fn request_token(&self, params: &[(&str, &str)]) -> Result<Token, Error> {
        let token_url = format!("{}/protocol/openid-connect/token", self.authority);

        let c = reqwest::blocking::Client::new();

        let fetched_at = Instant::now();
        let resp = c
            .post(&token_url)
            .header("Accept", "application/json")
            .form(params)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            return Err(Error::Token {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed = serde_json::from_str::<TokenResponse>(&text)?;
        debug!(
            "Acquired token from '{}', expires in {}s",
            token_url, parsed.expires_in
        );

        Ok(parsed.into_token(fetched_at))
    }
}

fn require_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| format!("Could not read {} from env", name).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keycloak_response() -> &'static str {
        r#"{
            "access_token": "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ0ZXN0In0.sig",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "refresh_token": "eyJhbGciOiJIUzI1NiJ9.refresh.sig",
            "token_type": "bearer",
            "not-before-policy": 0,
            "session_state": "76825e95-9d1c-4f40-8be7-4ecdcd32a6b1",
            "scope": "profile email"
        }"#
    }

    #[test]
    fn test_parse_token_response() {
        let parsed: TokenResponse = serde_json::from_str(keycloak_response()).unwrap();
        assert_eq!(parsed.expires_in, 300);
        assert_eq!(parsed.token_type, "bearer");
        assert_eq!(parsed.scope.as_deref(), Some("profile email"));

        let token = parsed.into_token(Instant::now());
        assert!(!token.is_expired());
        assert!(token.can_refresh());
    }

    #[test]
    fn test_parse_token_response_without_refresh() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"access_token": "abc", "expires_in": 60, "token_type": "bearer"}"#,
        )
        .unwrap();

        let token = parsed.into_token(Instant::now());
        assert!(token.refresh_token.is_none());
        assert!(!token.can_refresh());
    }

    #[test]
    fn test_token_expired_within_leeway() {
        let token = Token {
            access_token: "abc".to_string(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            scope: None,
            expiry: Instant::now() + Duration::from_secs(5),
            refresh_expiry: None,
        };
        // still 5s of lifetime left, but inside the leeway window
        assert!(token.is_expired());
    }

    #[test]
    fn test_refresh_expiry_in_past_blocks_refresh() {
        let now = Instant::now();
        let token = Token {
            access_token: "abc".to_string(),
            refresh_token: Some("def".to_string()),
            token_type: "bearer".to_string(),
            scope: None,
            expiry: now,
            refresh_expiry: Some(now),
        };
        assert!(!token.can_refresh());
    }

    #[test]
    fn test_authority_trailing_slash_trimmed() {
        let tm = TokenManager::new("https://idp.local/auth/realms/acme/", "u", "p", "c");
        assert_eq!(tm.authority(), "https://idp.local/auth/realms/acme");
    }
}
