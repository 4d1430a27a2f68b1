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

//! Configured client for the versioned omnikeeper REST API.
//!
//! Operation methods are grouped by controller in the [`crate::ci`],
//! [`crate::attribute`], [`crate::layer`] and [`crate::relation`] modules.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::token::TokenManager;

const API_VERSION: &str = "1.0";

pub struct ApiClient {
    base: String,
    version: String,
    token_manager: TokenManager,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    /// `base_url` is the omnikeeper server root, e.g. `https://omnikeeper.example.com`.
    pub fn new(base_url: &str, token_manager: TokenManager) -> Result<Self, Error> {
        // parse up front so later per-request URL building cannot fail on the base
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            version: API_VERSION.to_string(),
            token_manager,
            http: reqwest::blocking::Client::new(),
        })
    }

    /// Builds a client from the same environment variables as
    /// [`TokenManager::from_env`], plus OMNIKEEPER_URL for the server root.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("OMNIKEEPER_URL")
            .map_err(|_| Error::from("Could not read OMNIKEEPER_URL from env"))?;
        Self::new(&base_url, TokenManager::from_env()?)
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    fn operation_url(&self, controller: &str, operation: &str, query: &Query) -> Result<Url, Error> {
        let mut url = Url::parse(&format!(
            "{}/api/v{}/{}/{}",
            self.base, self.version, controller, operation
        ))?;
        if !query.0.is_empty() {
            url.query_pairs_mut().extend_pairs(query.0.iter());
        }
        Ok(url)
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        controller: &str,
        operation: &str,
        query: &Query,
    ) -> Result<T, Error> {
        let url = self.operation_url(controller, operation, query)?;
        let token = self.token_manager.token()?;

        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", token.access_token))
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) fn post_json<B: Serialize>(
        &self,
        controller: &str,
        operation: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.operation_url(controller, operation, &Query::new())?;
        let token = self.token_manager.token()?;

        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token.access_token))
            .body(serde_json::to_string(body)?)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), text));
        }

        Ok(())
    }
}

/// ASP.NET Core wraps many error responses in an RFC 7807 problem document.
#[derive(Debug, Deserialize)]
struct ProblemDetails {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn api_error(status: u16, body: String) -> Error {
    let message = match serde_json::from_str::<ProblemDetails>(&body) {
        Ok(problem) => problem.detail.or(problem.title).unwrap_or(body),
        Err(_) => body,
    };
    Error::Api { status, message }
}

/// Accumulates query parameters, with repeated keys for array-valued
/// parameters the way the server's model binding expects them.
pub(crate) struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Query(Vec::new())
    }

    pub fn add(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn add_layers(mut self, layer_ids: &[i64]) -> Self {
        for id in layer_ids {
            self.0.push(("layerIDs".to_string(), id.to_string()));
        }
        self
    }

    pub fn add_ciids(mut self, key: &str, ciids: &[Uuid]) -> Self {
        for ciid in ciids {
            self.0.push((key.to_string(), ciid.to_string()));
        }
        self
    }

    pub fn add_at_time(mut self, at_time: Option<DateTime<Utc>>) -> Self {
        if let Some(at_time) = at_time {
            self.0.push(("atTime".to_string(), at_time.to_rfc3339()));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_client() -> ApiClient {
        let tm = TokenManager::new("https://idp.local/auth/realms/acme", "u", "p", "c");
        ApiClient::new("https://omnikeeper.local/", tm).unwrap()
    }

    #[test]
    fn test_operation_url() {
        let client = test_client();
        let url = client
            .operation_url("CI", "getAllCIIDs", &Query::new())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://omnikeeper.local/api/v1.0/CI/getAllCIIDs"
        );
    }

    #[test]
    fn test_operation_url_with_repeated_layers() {
        let client = test_client();
        let query = Query::new()
            .add("name", "hostname")
            .add_layers(&[1, 2]);
        let url = client
            .operation_url("Attribute", "getMergedAttributesWithName", &query)
            .unwrap();
        assert_eq!(
            url.query(),
            Some("name=hostname&layerIDs=1&layerIDs=2")
        );
    }

    #[test]
    fn test_at_time_is_rfc3339() {
        let at_time = Utc.with_ymd_and_hms(2021, 3, 14, 9, 26, 53).unwrap();
        let query = Query::new().add_at_time(Some(at_time));
        assert_eq!(query.0[0].1, "2021-03-14T09:26:53+00:00");
    }

    #[test]
    fn test_api_error_prefers_problem_detail() {
        let err = api_error(
            404,
            r#"{"title": "Not Found", "detail": "Could not find layer with name foo", "status": 404}"#.to_string(),
        );
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Could not find layer with name foo");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = api_error(500, "boom".to_string());
        match err {
            Error::Api { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        let tm = TokenManager::new("https://idp.local/auth/realms/acme", "u", "p", "c");
        assert!(ApiClient::new("not a url", tm).is_err());
    }
}
