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

use std::fmt;

/// Errors surfaced by token management and API operations.
#[derive(Debug)]
pub enum Error {
    /// Generic failure with a human readable message.
    Message(String),

    /// Transport level failure from the underlying HTTP client.
    Http(reqwest::Error),

    /// Response body could not be deserialized.
    Json(serde_json::Error),

    /// The identity provider rejected a token request.
    Token { status: u16, body: String },

    /// The omnikeeper API answered with a non-success status.
    Api { status: u16, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Message(msg) => write!(f, "{}", msg),
            Error::Http(err) => write!(f, "http request failed: {}", err),
            Error::Json(err) => write!(f, "deserializing response failed: {}", err),
            Error::Token { status, body } => {
                write!(f, "token request failed: status='{}', body='{}'", status, body)
            }
            Error::Api { status, message } => {
                write!(f, "api request failed: status='{}', message='{}'", status, message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Message(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Message(format!("invalid url: {}", err))
    }
}
