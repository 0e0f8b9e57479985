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

//! OAuth2 authorization code and service account flows for reqauth.
//!
//! [`Authenticator`] is the entry point: it checks that the required settings
//! are present, delegates the exchange to a [`CredentialFlow`] and writes the
//! tokens into a [`CredentialState`] owned by the caller.
//!
//! ```no_run
//! use reqauth_core::{Context, OsEnv};
//! use reqauth_http_send_reqwest::ReqwestHttpSend;
//! use reqauth_oauth2::{Authenticator, Config};
//!
//! # async fn example() -> reqauth_core::Result<()> {
//! let ctx = Context::new()
//!     .with_http_send(ReqwestHttpSend::default())
//!     .with_env(OsEnv);
//! let config = Config::new()
//!     .with_client_id("client-id")
//!     .with_client_secret("client-secret")
//!     .with_redirect_uri("http://localhost:8080/callback")
//!     .with_scope("https://www.googleapis.com/auth/drive.readonly");
//! let auth = Authenticator::new(ctx, config);
//!
//! println!("open {}", auth.authorization_url(Some("state-123"))?);
//!
//! let mut state = auth.new_state();
//! auth.fetch_access_and_refresh_tokens(&mut state, "code-from-redirect")
//!     .await?;
//! let header = auth.authorization_header(&mut state).await?;
//! # let _ = header;
//! # Ok(())
//! # }
//! ```
//!
//! To sign requests through [`reqauth_core::Signer`], combine
//! [`OAuth2CredentialProvider`] with [`BearerSigner`].

mod constants;

mod config;
pub use config::{Config, OAuth2Mode};

mod credential;
pub use credential::{CredentialState, ServiceAccountKey, Token};

mod oauth2;

pub mod flow;
pub use flow::{CredentialFlow, OAuth2Flow};

mod authenticator;
pub use authenticator::{Authenticator, TokenObserver};

mod sign_request;
pub use sign_request::{bearer_header, BearerSigner};

mod provide_credential;
pub use provide_credential::OAuth2CredentialProvider;
