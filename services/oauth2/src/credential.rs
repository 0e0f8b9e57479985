// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt::{self, Debug};
use std::time::Duration;

use reqauth_core::encoding::base64_decode;
use reqauth_core::time::{now, seconds, DateTime};
use reqauth_core::utils::Redact;
use reqauth_core::{Error, Result, SigningCredential};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constants::DEFAULT_EXPIRY_CUTOFF;

/// Token is what an authorization server hands back for a successful token request.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The access token.
    pub access_token: String,
    /// The refresh token, only present for some grants.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<u64>,
    /// Token type, typically `Bearer`.
    pub token_type: Option<String>,
    /// Scopes actually granted, space separated.
    pub scope: Option<String>,
    /// When the token was issued.
    pub issued_at: DateTime,
}

impl Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &Redact::from(&self.access_token))
            .field("refresh_token", &Redact::from(&self.refresh_token))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// CredentialState is the caller-owned record of the tokens obtained so far.
///
/// Every operation of [`crate::Authenticator`] that obtains tokens takes the
/// state by `&mut` and writes the result back into it, so the caller decides
/// where it lives and how it is shared or persisted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialState {
    /// The current access token, empty if none was obtained yet.
    #[serde(default)]
    pub access_token: String,
    /// The current refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the tokens were last stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime>,
    /// Lifetime of the access token in seconds, counted from `updated_on`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// The refresh token was revoked; tokens stored in config must not be used again.
    #[serde(default, skip_serializing_if = "is_false")]
    pub revoked: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Debug for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialState")
            .field("access_token", &Redact::from(&self.access_token))
            .field("refresh_token", &Redact::from(&self.refresh_token))
            .field("updated_on", &self.updated_on)
            .field("expires_in", &self.expires_in)
            .field("revoked", &self.revoked)
            .finish()
    }
}

impl CredentialState {
    /// Seed a state with the tokens stored in config, if any.
    ///
    /// Tokens taken from config carry no timestamp, so the access token is
    /// treated as stale until it has been refreshed once.
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token: config.access_token.clone().unwrap_or_default(),
            refresh_token: config.refresh_token.clone().filter(|v| !v.is_empty()),
            updated_on: None,
            expires_in: None,
            revoked: false,
        }
    }

    /// When the access token expires, if known.
    pub fn expires_at(&self) -> Option<DateTime> {
        let updated_on = self.updated_on?;
        let expires_in = i64::try_from(self.expires_in?).unwrap_or(i64::MAX);
        updated_on.checked_add_signed(seconds(expires_in))
    }

    /// Check whether the access token must be refreshed before use.
    ///
    /// The token is stale when it is empty, when its lifetime is unknown, or
    /// when `updated_on + expires_in - cutoff` is not after `at`.
    pub fn is_stale_at(&self, cutoff: Duration, at: DateTime) -> bool {
        if self.access_token.is_empty() {
            return true;
        }

        let Some(expires_at) = self.expires_at() else {
            return true;
        };
        let cutoff = seconds(i64::try_from(cutoff.as_secs()).unwrap_or(i64::MAX));
        match expires_at.checked_sub_signed(cutoff) {
            Some(deadline) => deadline <= at,
            None => true,
        }
    }

    /// Copy a freshly obtained token into the state.
    ///
    /// A refresh token missing from the response keeps the one already stored.
    pub fn apply(&mut self, token: &Token) {
        self.access_token = token.access_token.clone();
        if let Some(refresh_token) = token.refresh_token.as_ref().filter(|v| !v.is_empty()) {
            self.refresh_token = Some(refresh_token.clone());
        }
        self.expires_in = token.expires_in;
        self.updated_on = Some(token.issued_at);
        self.revoked = false;
    }

    /// Forget every token and remember that the refresh token was revoked.
    pub fn mark_revoked(&mut self) {
        *self = Self {
            revoked: true,
            ..Self::default()
        };
    }
}

impl SigningCredential for CredentialState {
    fn is_valid(&self) -> bool {
        !self.is_stale_at(DEFAULT_EXPIRY_CUTOFF, now())
    }
}

/// ServiceAccountKey is the JSON key file downloaded for a service account.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Must be `service_account`.
    #[serde(rename = "type")]
    pub key_type: String,
    /// The client email of the service account.
    pub client_email: String,
    /// PEM encoded RSA private key.
    pub private_key: String,
    /// Id of the private key, sent as the JWT `kid` header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint the key was issued for.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("client_email", &self.client_email)
            .field("private_key", &Redact::from(&self.private_key))
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse a key file from bytes.
    pub fn from_slice(v: &[u8]) -> Result<Self> {
        let key: Self = serde_json::from_slice(v).map_err(|e| {
            Error::credential_invalid("failed to parse service account key").with_source(e)
        })?;

        if key.key_type != "service_account" {
            return Err(Error::credential_invalid(format!(
                "expected a service_account key, got {}",
                key.key_type
            )));
        }

        Ok(key)
    }

    /// Parse a key file from base64-encoded content.
    pub fn from_base64(content: &str) -> Result<Self> {
        let decoded = base64_decode(content)?;
        Self::from_slice(&decoded)
    }
}
