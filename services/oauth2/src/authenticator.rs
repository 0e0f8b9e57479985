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

use std::fmt::Debug;
use std::sync::Arc;

use http::HeaderValue;
use log::debug;

use reqauth_core::time::now;
use reqauth_core::{Context, Error, ErrorKind, Result};

use crate::config::{Config, OAuth2Mode};
use crate::credential::{CredentialState, Token};
use crate::flow::{
    AuthorizationRequest, CodeExchangeRequest, CredentialFlow, OAuth2Flow, RefreshRequest,
    ServiceAccountRequest,
};
use crate::sign_request::bearer_header;

/// TokenObserver is notified every time new tokens have been obtained.
///
/// Use it to persist tokens; the same [`Token`] is also returned to the caller.
pub trait TokenObserver: Debug + Send + Sync + 'static {
    /// Called after the tokens have been written into the credential state.
    fn on_tokens_obtained(&self, token: &Token);
}

/// Authenticator validates inputs, runs a [`CredentialFlow`] and stores the
/// obtained tokens into a caller-owned [`CredentialState`].
///
/// ```no_run
/// use reqauth_core::{Context, OsEnv};
/// use reqauth_oauth2::{Authenticator, Config};
///
/// # async fn example() -> reqauth_core::Result<()> {
/// let ctx = Context::new().with_env(OsEnv);
/// let auth = Authenticator::new(ctx.clone(), Config::from_env(&ctx)?);
///
/// let mut state = auth.new_state();
/// let header = auth.authorization_header(&mut state).await?;
/// # let _ = header;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    ctx: Context,
    config: Config,
    flow: Arc<dyn CredentialFlow>,
    observer: Option<Arc<dyn TokenObserver>>,
}

impl Authenticator {
    /// Create an authenticator talking to the endpoints in `config`.
    pub fn new(ctx: Context, config: Config) -> Self {
        let flow = Arc::new(OAuth2Flow::from_config(&config));
        Self {
            ctx,
            config,
            flow,
            observer: None,
        }
    }

    /// Replace the flow that performs the network exchanges.
    pub fn with_flow(mut self, flow: impl CredentialFlow) -> Self {
        self.flow = Arc::new(flow);
        self
    }

    /// Set the observer notified when new tokens are obtained.
    pub fn with_observer(mut self, observer: impl TokenObserver) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Replace the context used for network and file access.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// The config this authenticator was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A credential state seeded with the tokens stored in config.
    pub fn new_state(&self) -> CredentialState {
        CredentialState::from_config(&self.config)
    }

    /// Build the URL of the consent page.
    ///
    /// `state` is an opaque value echoed back to the redirect URI.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String> {
        self.authorization_url_with_login_hint(state, None)
    }

    /// Build the URL of the consent page, preselecting the account `login_hint`.
    pub fn authorization_url_with_login_hint(
        &self,
        state: Option<&str>,
        login_hint: Option<&str>,
    ) -> Result<String> {
        let scope = self.config.scope();
        let req = AuthorizationRequest {
            client_id: require("client_id", self.config.client_id.as_deref())?.to_string(),
            redirect_uri: require("redirect_uri", self.config.redirect_uri.as_deref())?
                .to_string(),
            scope: require("scope", Some(scope.as_str()))?.to_string(),
            offline: self.config.is_offline,
            state: state.filter(|v| !v.is_empty()).map(String::from),
            login_hint: login_hint.filter(|v| !v.is_empty()).map(String::from),
        };

        self.flow
            .authorization_url(&req)
            .map_err(|e| wrap_error("build authorization url", e))
    }

    /// Exchange an authorization code for an access token and a refresh token.
    pub async fn fetch_access_and_refresh_tokens(
        &self,
        state: &mut CredentialState,
        code: &str,
    ) -> Result<Token> {
        let req = CodeExchangeRequest {
            client_id: require("client_id", self.config.client_id.as_deref())?.to_string(),
            client_secret: require("client_secret", self.config.client_secret.as_deref())?
                .to_string(),
            redirect_uri: require("redirect_uri", self.config.redirect_uri.as_deref())?
                .to_string(),
            code: require("code", Some(code))?.to_string(),
        };

        let token = self
            .flow
            .exchange_code(&self.ctx, &req)
            .await
            .map_err(|e| wrap_error("exchange authorization code", e))?;
        Ok(self.store(state, token))
    }

    /// Obtain a new access token with the refresh token.
    ///
    /// The refresh token stored in `state` is preferred over the one in config.
    pub async fn refresh_access_token(&self, state: &mut CredentialState) -> Result<Token> {
        let req = RefreshRequest {
            client_id: require("client_id", self.config.client_id.as_deref())?.to_string(),
            client_secret: require("client_secret", self.config.client_secret.as_deref())?
                .to_string(),
            refresh_token: require("refresh_token", self.refresh_token(state))?.to_string(),
        };

        let token = self
            .flow
            .refresh_token(&self.ctx, &req)
            .await
            .map_err(|e| wrap_error("refresh access token", e))?;
        Ok(self.store(state, token))
    }

    /// Revoke the refresh token and forget every token held by `state`.
    ///
    /// Afterwards `state` is marked revoked, so the refresh token in config is
    /// no longer used for it.
    pub async fn revoke_refresh_token(&self, state: &mut CredentialState) -> Result<()> {
        let refresh_token = require("refresh_token", self.refresh_token(state))?;

        self.flow
            .revoke_token(&self.ctx, refresh_token)
            .await
            .map_err(|e| wrap_error("revoke refresh token", e))?;

        debug!("refresh token revoked, clearing credential state");
        state.mark_revoked();
        Ok(())
    }

    /// Obtain an access token for the configured service account.
    pub async fn generate_access_token_for_service_account(
        &self,
        state: &mut CredentialState,
    ) -> Result<Token> {
        let scope = self.config.scope();
        let req = ServiceAccountRequest {
            client_email: require(
                "service_account_email",
                self.config.service_account_email.as_deref(),
            )?
            .to_string(),
            private_key: require("private_key", self.config.private_key.as_deref())?.to_string(),
            private_key_id: self.config.private_key_id.clone(),
            scope: require("scope", Some(scope.as_str()))?.to_string(),
            subject: self.config.delegated_account.clone(),
        };

        let token = self
            .flow
            .service_account_token(&self.ctx, &req)
            .await
            .map_err(|e| wrap_error("generate service account token", e))?;
        Ok(self.store(state, token))
    }

    /// Obtain a new access token with the flow selected by [`Config::mode`].
    pub async fn obtain_token(&self, state: &mut CredentialState) -> Result<Token> {
        match self.config.mode {
            OAuth2Mode::Application => self.refresh_access_token(state).await,
            OAuth2Mode::ServiceAccount => {
                self.generate_access_token_for_service_account(state)
                    .await
            }
        }
    }

    /// Check whether the access token in `state` must be refreshed before use.
    pub fn is_access_token_stale(&self, state: &CredentialState) -> bool {
        state.is_stale_at(self.config.expiry_cutoff, now())
    }

    /// Build a `Bearer` authorization header, refreshing the access token first if it is stale.
    pub async fn authorization_header(&self, state: &mut CredentialState) -> Result<HeaderValue> {
        if self.is_access_token_stale(state) {
            debug!("access token is missing or stale, obtaining a new one");
            self.obtain_token(state).await?;
        }

        bearer_header(&state.access_token)
    }

    fn refresh_token<'a>(&'a self, state: &'a CredentialState) -> Option<&'a str> {
        let stored = state.refresh_token.as_deref().filter(|v| !v.is_empty());
        if state.revoked {
            return stored;
        }
        stored.or(self.config.refresh_token.as_deref())
    }

    fn store(&self, state: &mut CredentialState, token: Token) -> Token {
        state.apply(&token);
        debug!(
            "stored new access token, expires in {:?} seconds",
            token.expires_in
        );

        if let Some(observer) = &self.observer {
            observer.on_tokens_obtained(&token);
        }
        token
    }
}

/// Return `value` if it is present and not blank.
fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::parameter_missing(field)),
    }
}

/// Turn a flow failure into a `TokenRequestFailed` error that keeps the
/// remote error code and status.
fn wrap_error(action: &str, err: Error) -> Error {
    if err.kind() == ErrorKind::ParameterMissing {
        return err;
    }

    let code = err.code().map(String::from);
    let status = err.status();
    let message = match (&code, status) {
        (Some(code), Some(status)) => format!("failed to {action}: {code} ({status})"),
        (Some(code), None) => format!("failed to {action}: {code}"),
        (None, Some(status)) => format!("failed to {action}: status {status}"),
        (None, None) => format!("failed to {action}"),
    };

    let mut wrapped = Error::token_request_failed(message);
    if let Some(code) = code {
        wrapped = wrapped.with_code(code);
    }
    if let Some(status) = status {
        wrapped = wrapped.with_status(status);
    }
    wrapped.with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use reqauth_core::time::seconds;
    use std::sync::Mutex;
    use test_case::test_case;

    /// Records every call and answers with a canned token or error.
    #[derive(Debug, Default, Clone)]
    struct MockFlow {
        calls: Arc<Mutex<Vec<String>>>,
        fail_with: Option<(&'static str, StatusCode)>,
        refresh_token_in_response: Option<&'static str>,
    }

    impl MockFlow {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self, call: String, access_token: &str) -> Result<Token> {
            self.calls.lock().unwrap().push(call);
            if let Some((code, status)) = self.fail_with {
                return Err(Error::token_request_failed(code)
                    .with_code(code)
                    .with_status(status));
            }
            Ok(Token {
                access_token: access_token.to_string(),
                refresh_token: self.refresh_token_in_response.map(String::from),
                expires_in: Some(3600),
                token_type: Some("Bearer".to_string()),
                scope: None,
                issued_at: now(),
            })
        }
    }

    #[async_trait]
    impl CredentialFlow for MockFlow {
        fn authorization_url(&self, req: &AuthorizationRequest) -> Result<String> {
            Ok(format!(
                "https://auth.example.com/?client_id={}&offline={}&state={:?}",
                req.client_id, req.offline, req.state
            ))
        }

        async fn exchange_code(&self, _: &Context, req: &CodeExchangeRequest) -> Result<Token> {
            self.respond(format!("exchange:{}", req.code), "access-from-code")
        }

        async fn refresh_token(&self, _: &Context, req: &RefreshRequest) -> Result<Token> {
            self.respond(format!("refresh:{}", req.refresh_token), "access-from-refresh")
        }

        async fn revoke_token(&self, _: &Context, token: &str) -> Result<()> {
            self.respond(format!("revoke:{token}"), "").map(|_| ())
        }

        async fn service_account_token(
            &self,
            _: &Context,
            req: &ServiceAccountRequest,
        ) -> Result<Token> {
            self.respond(
                format!("service_account:{}:{:?}", req.client_email, req.subject),
                "access-from-jwt",
            )
        }
    }

    #[derive(Debug, Default, Clone)]
    struct RecordingObserver(Arc<Mutex<Vec<String>>>);

    impl TokenObserver for RecordingObserver {
        fn on_tokens_obtained(&self, token: &Token) {
            self.0.lock().unwrap().push(token.access_token.clone());
        }
    }

    fn app_config() -> Config {
        Config::new()
            .with_client_id("client")
            .with_client_secret("secret")
            .with_redirect_uri("https://app.example.com/cb")
            .with_scope("email")
    }

    fn authenticator(config: Config, flow: &MockFlow) -> Authenticator {
        Authenticator::new(Context::new(), config).with_flow(flow.clone())
    }

    #[test]
    fn test_authorization_url() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        assert_eq!(
            auth.authorization_url(Some("xyz")).unwrap(),
            "https://auth.example.com/?client_id=client&offline=true&state=Some(\"xyz\")"
        );
    }

    #[test_case(Config::new().with_redirect_uri("r").with_scope("s"), "client_id" ; "client id")]
    #[test_case(Config::new().with_client_id("c").with_scope("s"), "redirect_uri" ; "redirect uri")]
    #[test_case(Config::new().with_client_id("c").with_redirect_uri("r"), "scope" ; "scope")]
    #[test_case(Config::new().with_client_id(" ").with_redirect_uri("r").with_scope("s"), "client_id" ; "blank client id")]
    fn test_authorization_url_requires(config: Config, field: &str) {
        let auth = authenticator(config, &MockFlow::default());

        let err = auth.authorization_url(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterMissing);
        assert_eq!(err.to_string(), format!("{field} is required"));
    }

    #[tokio::test]
    async fn test_fetch_access_and_refresh_tokens() {
        let flow = MockFlow {
            refresh_token_in_response: Some("refresh-from-code"),
            ..Default::default()
        };
        let observer = RecordingObserver::default();
        let auth = authenticator(app_config(), &flow).with_observer(observer.clone());

        let mut state = auth.new_state();
        let token = auth
            .fetch_access_and_refresh_tokens(&mut state, "4/code")
            .await
            .unwrap();

        assert_eq!(token.access_token, "access-from-code");
        assert_eq!(state.access_token, "access-from-code");
        assert_eq!(state.refresh_token.as_deref(), Some("refresh-from-code"));
        assert_eq!(state.expires_in, Some(3600));
        assert_eq!(state.updated_on, Some(token.issued_at));
        assert!(!auth.is_access_token_stale(&state));
        assert_eq!(flow.calls(), vec!["exchange:4/code"]);
        assert_eq!(*observer.0.lock().unwrap(), vec!["access-from-code"]);
    }

    #[tokio::test]
    async fn test_fetch_tokens_requires_code_before_any_request() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        let mut state = auth.new_state();
        let err = auth
            .fetch_access_and_refresh_tokens(&mut state, "")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ParameterMissing);
        assert_eq!(err.to_string(), "code is required");
        assert!(flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_tokens_requires_client_secret() {
        let flow = MockFlow::default();
        let config = Config::new()
            .with_client_id("client")
            .with_redirect_uri("https://app.example.com/cb");
        let auth = authenticator(config, &flow);

        let err = auth
            .fetch_access_and_refresh_tokens(&mut CredentialState::default(), "4/code")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "client_secret is required");
        assert!(flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_prefers_state_token_and_keeps_it() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config().with_refresh_token("from-config"), &flow);

        let mut state = auth.new_state();
        state.refresh_token = Some("from-state".to_string());

        auth.refresh_access_token(&mut state).await.unwrap();

        assert_eq!(flow.calls(), vec!["refresh:from-state"]);
        assert_eq!(state.access_token, "access-from-refresh");
        assert_eq!(state.refresh_token.as_deref(), Some("from-state"));
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_config_token() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config().with_refresh_token("from-config"), &flow);

        let mut state = CredentialState::default();
        auth.refresh_access_token(&mut state).await.unwrap();

        assert_eq!(flow.calls(), vec!["refresh:from-config"]);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        let err = auth
            .refresh_access_token(&mut CredentialState::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "refresh_token is required");
        assert!(flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_error_is_wrapped() {
        let flow = MockFlow {
            fail_with: Some(("invalid_grant", StatusCode::BAD_REQUEST)),
            ..Default::default()
        };
        let observer = RecordingObserver::default();
        let auth = authenticator(app_config().with_refresh_token("r"), &flow)
            .with_observer(observer.clone());

        let mut state = auth.new_state();
        let err = auth.refresh_access_token(&mut state).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TokenRequestFailed);
        assert_eq!(err.code(), Some("invalid_grant"));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "failed to refresh access token: invalid_grant (400 Bad Request)"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(state.access_token, "");
        assert!(observer.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wrap_error_without_details() {
        let err = wrap_error(
            "revoke refresh token",
            Error::unexpected("connection reset"),
        );
        assert_eq!(err.kind(), ErrorKind::TokenRequestFailed);
        assert_eq!(err.to_string(), "failed to revoke refresh token");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_wrap_error_keeps_parameter_errors() {
        let err = wrap_error("refresh access token", Error::parameter_missing("scope"));
        assert_eq!(err.kind(), ErrorKind::ParameterMissing);
        assert_eq!(err.to_string(), "scope is required");
    }

    #[tokio::test]
    async fn test_revoke_clears_state() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        let mut state = CredentialState {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            updated_on: Some(now()),
            expires_in: Some(3600),
            revoked: false,
        };
        auth.revoke_refresh_token(&mut state).await.unwrap();

        assert_eq!(flow.calls(), vec!["revoke:refresh"]);
        assert_eq!(
            state,
            CredentialState {
                revoked: true,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_after_revoke_ignores_config_token() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config().with_refresh_token("revoked"), &flow);

        let mut state = auth.new_state();
        auth.revoke_refresh_token(&mut state).await.unwrap();

        let err = auth.authorization_header(&mut state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterMissing);
        assert_eq!(err.to_string(), "refresh_token is required");
        assert_eq!(flow.calls(), vec!["revoke:revoked"]);
    }

    #[tokio::test]
    async fn test_refresh_clears_revoked_mark() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        let mut state = CredentialState {
            refresh_token: Some("fresh".to_string()),
            revoked: true,
            ..Default::default()
        };
        auth.refresh_access_token(&mut state).await.unwrap();

        assert!(!state.revoked);
        assert_eq!(flow.calls(), vec!["refresh:fresh"]);
    }

    #[tokio::test]
    async fn test_revoke_failure_keeps_state() {
        let flow = MockFlow {
            fail_with: Some(("invalid_token", StatusCode::BAD_REQUEST)),
            ..Default::default()
        };
        let auth = authenticator(app_config(), &flow);

        let mut state = CredentialState {
            refresh_token: Some("refresh".to_string()),
            ..Default::default()
        };
        let err = auth.revoke_refresh_token(&mut state).await.unwrap_err();

        assert_eq!(err.code(), Some("invalid_token"));
        assert_eq!(state.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_service_account_token() {
        let flow = MockFlow::default();
        let config = Config::new()
            .with_mode(OAuth2Mode::ServiceAccount)
            .with_service_account_email("robot@example.com")
            .with_private_key("pem")
            .with_delegated_account("user@example.com")
            .with_scope("https://www.googleapis.com/auth/drive");
        let auth = authenticator(config, &flow);

        let mut state = CredentialState::default();
        let token = auth
            .generate_access_token_for_service_account(&mut state)
            .await
            .unwrap();

        assert_eq!(token.access_token, "access-from-jwt");
        assert_eq!(state.access_token, "access-from-jwt");
        assert_eq!(
            flow.calls(),
            vec!["service_account:robot@example.com:Some(\"user@example.com\")"]
        );
    }

    #[test_case(Config::new().with_private_key("pem").with_scope("s"), "service_account_email" ; "email")]
    #[test_case(Config::new().with_service_account_email("e").with_scope("s"), "private_key" ; "private key")]
    #[test_case(Config::new().with_service_account_email("e").with_private_key("pem"), "scope" ; "scope")]
    #[tokio::test]
    async fn test_service_account_requires(config: Config, field: &str) {
        let flow = MockFlow::default();
        let auth = authenticator(config, &flow);

        let err = auth
            .generate_access_token_for_service_account(&mut CredentialState::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("{field} is required"));
        assert!(flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_authorization_header_refreshes_stale_token() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config().with_refresh_token("r"), &flow);

        let mut state = auth.new_state();
        state.access_token = "old".to_string();
        state.updated_on = Some(now() - seconds(3570));
        state.expires_in = Some(3600);
        assert!(auth.is_access_token_stale(&state));

        let header = auth.authorization_header(&mut state).await.unwrap();
        assert_eq!(header, "Bearer access-from-refresh");
        assert!(header.is_sensitive());
        assert_eq!(flow.calls(), vec!["refresh:r"]);
    }

    #[tokio::test]
    async fn test_authorization_header_uses_fresh_token() {
        let flow = MockFlow::default();
        let auth = authenticator(app_config(), &flow);

        let mut state = CredentialState {
            access_token: "still-good".to_string(),
            refresh_token: None,
            updated_on: Some(now() - seconds(60)),
            expires_in: Some(3600),
            revoked: false,
        };

        let header = auth.authorization_header(&mut state).await.unwrap();
        assert_eq!(header, "Bearer still-good");
        assert!(flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_authorization_header_uses_service_account_mode() {
        let flow = MockFlow::default();
        let config = Config::new()
            .with_mode(OAuth2Mode::ServiceAccount)
            .with_service_account_email("robot@example.com")
            .with_private_key("pem")
            .with_scope("s");
        let auth = authenticator(config, &flow);

        let header = auth
            .authorization_header(&mut CredentialState::default())
            .await
            .unwrap();
        assert_eq!(header, "Bearer access-from-jwt");
    }

    #[test]
    fn test_custom_expiry_cutoff() {
        let auth = authenticator(
            app_config().with_expiry_cutoff(std::time::Duration::from_secs(600)),
            &MockFlow::default(),
        );
        let state = CredentialState {
            access_token: "t".to_string(),
            refresh_token: None,
            updated_on: Some(now() - seconds(3100)),
            expires_in: Some(3600),
            revoked: false,
        };
        assert!(auth.is_access_token_stale(&state));
    }
}
