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

//! Core building blocks shared by the reqauth crates.
//!
//! - [`Context`] carries the pluggable I/O: file reading, HTTP sending and environment access.
//! - [`ProvideCredential`] obtains a credential, [`SignRequest`] applies it to a request.
//! - [`Signer`] caches the credential and asks for a new one once [`SigningCredential::is_valid`]
//!   turns false.
//! - [`Error`] is the single error type, keeping the OAuth2 error code and HTTP status of
//!   failed token requests.
//!
//! ```no_run
//! use async_trait::async_trait;
//! use reqauth_core::{Context, ProvideCredential, Result, SignRequest, SigningCredential, Signer};
//!
//! #[derive(Clone, Debug)]
//! struct StaticToken(String);
//!
//! impl SigningCredential for StaticToken {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct FromEnv;
//!
//! #[async_trait]
//! impl ProvideCredential for FromEnv {
//!     type Credential = StaticToken;
//!
//!     async fn provide_credential(&self, ctx: &Context) -> Result<Option<StaticToken>> {
//!         Ok(ctx.env_var("ACCESS_TOKEN").map(StaticToken))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Bearer;
//!
//! #[async_trait]
//! impl SignRequest for Bearer {
//!     type Credential = StaticToken;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut http::request::Parts,
//!         cred: Option<&StaticToken>,
//!     ) -> Result<()> {
//!         if let Some(cred) = cred {
//!             let value = format!("Bearer {}", cred.0).parse()?;
//!             req.headers.insert(http::header::AUTHORIZATION, value);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new().with_env(reqauth_core::OsEnv), FromEnv, Bearer);
//!
//! let (mut parts, _) = http::Request::get("https://www.googleapis.com/drive/v3/files")
//!     .body(())?
//!     .into_parts();
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod encoding;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, FileRead, HttpSend, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod signer;
pub use signer::Signer;
