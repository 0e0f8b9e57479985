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

//! Protocol level operations against an OAuth2 authorization server.
//!
//! [`crate::Authenticator`] validates its inputs and keeps the credential
//! state; the actual wire exchange is delegated to a [`CredentialFlow`].
//! [`OAuth2Flow`] talks to a standard authorization server, tests and
//! callers with unusual servers can plug in their own.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use reqauth_core::utils::Redact;
use reqauth_core::{Context, Result};

use crate::credential::Token;

mod assertion;
pub use assertion::build_assertion;
pub use assertion::Claims;

mod standard;
pub use standard::OAuth2Flow;

/// Parameters of the consent page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    /// Space separated scopes.
    pub scope: String,
    /// Ask for a refresh token.
    pub offline: bool,
    /// Opaque value echoed back to the redirect URI.
    pub state: Option<String>,
    /// Account to preselect on the consent page.
    pub login_hint: Option<String>,
}

/// Parameters of the authorization code exchange.
#[derive(Clone)]
pub struct CodeExchangeRequest {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

impl Debug for CodeExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeExchangeRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("code", &Redact::from(&self.code))
            .finish()
    }
}

/// Parameters of the refresh token grant.
#[derive(Clone)]
pub struct RefreshRequest {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("refresh_token", &Redact::from(&self.refresh_token))
            .finish()
    }
}

/// Parameters of the JWT bearer grant used by service accounts.
#[derive(Clone)]
pub struct ServiceAccountRequest {
    /// Service account email, the `iss` claim.
    pub client_email: String,
    /// PEM encoded RSA private key.
    pub private_key: String,
    /// Sent as the JWT `kid` header when present.
    pub private_key_id: Option<String>,
    /// Space separated scopes.
    pub scope: String,
    /// Account to impersonate, the `sub` claim.
    pub subject: Option<String>,
}

impl Debug for ServiceAccountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountRequest")
            .field("client_email", &self.client_email)
            .field("private_key", &Redact::from(&self.private_key))
            .field("private_key_id", &self.private_key_id)
            .field("scope", &self.scope)
            .field("subject", &self.subject)
            .finish()
    }
}

/// CredentialFlow performs the network side of every OAuth2 operation.
///
/// Implementations may assume that all required fields of a request are
/// present and non-empty.
#[async_trait]
pub trait CredentialFlow: Debug + Send + Sync + 'static {
    /// Build the URL of the consent page.
    fn authorization_url(&self, req: &AuthorizationRequest) -> Result<String>;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, ctx: &Context, req: &CodeExchangeRequest) -> Result<Token>;

    /// Obtain a new access token with a refresh token.
    async fn refresh_token(&self, ctx: &Context, req: &RefreshRequest) -> Result<Token>;

    /// Revoke a refresh or access token.
    async fn revoke_token(&self, ctx: &Context, token: &str) -> Result<()>;

    /// Obtain an access token with a signed JWT assertion.
    async fn service_account_token(
        &self,
        ctx: &Context,
        req: &ServiceAccountRequest,
    ) -> Result<Token>;
}
