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

//! Local validation of access tokens against the Keycloak realm's published
//! signing keys.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use jwt::{Header, PKeyWithDigest, RegisteredClaims, Token as JwtToken, VerifyWithKey};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use serde::{Deserialize, Serialize};
use serde_json;
use serde_with::{
    base64::{Base64, UrlSafe},
    serde_as,
};

use crate::token::Token;

type Error = Box<dyn std::error::Error>;
type Claims = HashMap<String, serde_json::value::Value>;

const EXPIRES_LEEWAY: Duration = Duration::from_secs(5);

/// Verifies the RS256 signature of `token` against the realm's JWKS and
/// checks the registered claims, returning the full claim set on success.
///
/// `authority` is the realm base URL the token was issued by, e.g.
/// `https://auth.example.com/auth/realms/omnikeeper`.
pub fn validate_token(token: &Token, authority: &str) -> Result<Claims, Error> {
    let jwt: JwtToken<Header, HashMap<String, serde_json::value::Value>, _> =
        JwtToken::parse_unverified(&token.access_token)?;
    let key_id = jwt.header().key_id.as_ref().ok_or(InvalidTokenError {
        message: "Token has no signing Key ID".to_string(),
    })?;

    // get realm public keys from the identity provider
    let keys = retrieve_keys(authority)?.keys;
    let key = keys
        .iter()
        .filter(|k| k.kty == "RSA")
        .find(|&k| k.kid == *key_id)
        .ok_or(InvalidTokenError {
            message: "No signing key found for token key id".to_string(),
        })?;

    let rsa_key =
        Rsa::from_public_components(BigNum::from_slice(&key.n)?, BigNum::from_slice(&key.e)?)?;

    // create verifier
    let rs256_verifier = PKeyWithDigest {
        digest: MessageDigest::sha256(),
        key: PKey::from_rsa(rsa_key)?,
    };

    // verify token
    let reg_claims: RegisteredClaims = token.access_token.verify_with_key(&rs256_verifier)?;

    // verify claims
    _validate_iss(&reg_claims, authority)?;
    _validate_iat(&reg_claims)?;
    _validate_exp(&reg_claims, EXPIRES_LEEWAY)?;

    // return claims
    Ok(jwt.claims().clone())
}

#[derive(Debug, Clone)]
pub struct InvalidTokenError {
    message: String,
}

impl std::fmt::Display for InvalidTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InvalidTokenError {}

fn _validate_iss(claims: &RegisteredClaims, authority: &str) -> Result<(), Error> {
    // assert issuer is the expected realm
    let er = InvalidTokenError {
        message: format!("Issuer must be '{}'", authority),
    };
    let iss = claims.issuer.as_ref().ok_or(er.clone())?;
    if iss.trim_end_matches('/') != authority.trim_end_matches('/') {
        return Err(er.into());
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn _validate_iat(claims: &RegisteredClaims) -> Result<(), Error> {
    // assert issued-at not in future
    let er = InvalidTokenError {
        message: "Issued At is None or in the future".to_string(),
    };
    let iat = claims.issued_at.ok_or(er.clone())?;

    if iat > unix_now() {
        return Err(er.into());
    }

    Ok(())
}

fn _validate_exp(claims: &RegisteredClaims, leeway: std::time::Duration) -> Result<(), Error> {
    // assert not expired with leeway
    let er = InvalidTokenError {
        message: "Expiration is None or in the past".to_string(),
    };
    let exp = claims.expiration.ok_or(er.clone())?;

    if (exp + leeway.as_secs()) < unix_now() {
        return Err(er.into());
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeysResponse {
    keys: Vec<Key>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Key {
    kty: String,
    kid: String,
    alg: String,
    #[serde_as(as = "Base64<UrlSafe>")]
    n: Vec<u8>,
    #[serde_as(as = "Base64<UrlSafe>")]
    e: Vec<u8>,
}

fn retrieve_keys(authority: &str) -> Result<KeysResponse, Error> {
    let c = reqwest::blocking::Client::new();

    let resp = c
        .get(format!(
            "{}/protocol/openid-connect/certs",
            authority.trim_end_matches('/')
        ))
        .header("Accept", "application/json")
        .send()?;

    let text = resp.text()?;
    Ok(serde_json::from_str(&text)?)
}
