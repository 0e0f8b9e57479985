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

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use reqauth_core::{Context, ProvideCredential, Result};

use crate::authenticator::Authenticator;
use crate::config::Config;
use crate::credential::CredentialState;

/// OAuth2CredentialProvider obtains tokens with the flow selected by the config mode.
///
/// The latest state is kept so that a rotated refresh token is used for the
/// next refresh. Concurrent callers are serialized while a token is obtained,
/// so only one of them talks to the authorization server.
#[derive(Debug, Clone)]
pub struct OAuth2CredentialProvider {
    authenticator: Authenticator,
    state: Arc<Mutex<CredentialState>>,
}

impl OAuth2CredentialProvider {
    /// Create a provider from config, using the default flow.
    pub fn new(config: Config) -> Self {
        Self::with_authenticator(Authenticator::new(Context::new(), config))
    }

    /// Create a provider from a configured authenticator, e.g. one with an observer.
    ///
    /// The context passed to `provide_credential` replaces the authenticator's own.
    pub fn with_authenticator(authenticator: Authenticator) -> Self {
        let state = authenticator.new_state();
        Self {
            authenticator,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Snapshot of the latest credential state.
    pub async fn state(&self) -> CredentialState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl ProvideCredential for OAuth2CredentialProvider {
    type Credential = CredentialState;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut state = self.state.lock().await;
        let authenticator = self.authenticator.clone().with_context(ctx.clone());

        if !authenticator.is_access_token_stale(&state) {
            return Ok(Some(state.clone()));
        }

        debug!(
            "obtaining OAuth2 access token with {:?} flow",
            authenticator.config().mode
        );
        authenticator.obtain_token(&mut state).await?;
        Ok(Some(state.clone()))
    }
}
