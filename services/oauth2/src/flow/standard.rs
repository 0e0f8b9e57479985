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

use async_trait::async_trait;
use log::debug;

use reqauth_core::time::now;
use reqauth_core::{Context, Result};

use super::{
    build_assertion, AuthorizationRequest, CodeExchangeRequest, CredentialFlow, RefreshRequest,
    ServiceAccountRequest,
};
use crate::config::Config;
use crate::constants::*;
use crate::credential::Token;
use crate::oauth2::helpers::{encode_form, form_post, form_post_json, token_from_response};
use crate::oauth2::types::TokenResponse;

/// OAuth2Flow talks to an RFC 6749 authorization server over [`Context::http_send`].
#[derive(Debug, Clone)]
pub struct OAuth2Flow {
    auth_url: String,
    token_url: String,
    revoke_url: String,
}

impl Default for OAuth2Flow {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            revoke_url: DEFAULT_REVOKE_URL.to_string(),
        }
    }
}

impl OAuth2Flow {
    /// Create a flow against the given endpoints.
    pub fn new(
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        revoke_url: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            revoke_url: revoke_url.into(),
        }
    }

    /// Create a flow against the endpoints configured in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.auth_url, &config.token_url, &config.revoke_url)
    }

    async fn request_token(&self, ctx: &Context, params: &[(&str, &str)]) -> Result<Token> {
        let issued_at = now();
        let resp: TokenResponse = form_post_json(ctx, &self.token_url, params).await?;
        Ok(token_from_response(resp, issued_at))
    }
}

#[async_trait]
impl CredentialFlow for OAuth2Flow {
    fn authorization_url(&self, req: &AuthorizationRequest) -> Result<String> {
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", req.client_id.as_str()),
            ("redirect_uri", req.redirect_uri.as_str()),
            ("scope", req.scope.as_str()),
        ];
        if req.offline {
            params.push(("access_type", "offline"));
            params.push(("prompt", "consent"));
        }
        if let Some(state) = &req.state {
            params.push(("state", state.as_str()));
        }
        if let Some(hint) = &req.login_hint {
            params.push(("login_hint", hint.as_str()));
        }

        let sep = if self.auth_url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{sep}{}", self.auth_url, encode_form(&params)))
    }

    async fn exchange_code(&self, ctx: &Context, req: &CodeExchangeRequest) -> Result<Token> {
        debug!("exchanging authorization code for tokens");

        self.request_token(
            ctx,
            &[
                ("grant_type", GRANT_AUTHORIZATION_CODE),
                ("code", req.code.as_str()),
                ("client_id", req.client_id.as_str()),
                ("client_secret", req.client_secret.as_str()),
                ("redirect_uri", req.redirect_uri.as_str()),
            ],
        )
        .await
    }

    async fn refresh_token(&self, ctx: &Context, req: &RefreshRequest) -> Result<Token> {
        debug!("exchanging refresh token for access token");

        self.request_token(
            ctx,
            &[
                ("grant_type", GRANT_REFRESH_TOKEN),
                ("refresh_token", req.refresh_token.as_str()),
                ("client_id", req.client_id.as_str()),
                ("client_secret", req.client_secret.as_str()),
            ],
        )
        .await
    }

    async fn revoke_token(&self, ctx: &Context, token: &str) -> Result<()> {
        debug!("revoking token");

        form_post(ctx, &self.revoke_url, &[("token", token)]).await?;
        Ok(())
    }

    async fn service_account_token(
        &self,
        ctx: &Context,
        req: &ServiceAccountRequest,
    ) -> Result<Token> {
        debug!(
            "exchanging service account {} for token with scope: {}",
            req.client_email, req.scope
        );

        let assertion = build_assertion(req, &self.token_url, now())?;
        self.request_token(
            ctx,
            &[("grant_type", GRANT_JWT_BEARER), ("assertion", assertion.as_str())],
        )
        .await
    }
}
