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

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Error, Result};

/// Context bundles the pluggable I/O needed to obtain tokens: reading key
/// files, sending token requests and looking up environment variables.
///
/// A fresh context has nothing configured. Every missing piece behaves as
/// empty (env) or fails with `ConfigInvalid` (files, HTTP), so a context
/// only needs what the chosen flow actually touches.
///
/// ```
/// use reqauth_core::{Context, OsEnv};
///
/// let ctx = Context::new().with_env(OsEnv);
/// assert!(ctx.env_var("SURELY_NOT_SET_BY_ANYONE").is_none());
/// ```
#[derive(Clone)]
pub struct Context {
    files: Arc<dyn FileRead>,
    client: Arc<dyn HttpSend>,
    env: Arc<dyn Env>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("files", &self.files)
            .field("client", &self.client)
            .field("env", &self.env)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with nothing configured.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Unconfigured),
            client: Arc::new(Unconfigured),
            env: Arc::new(Unconfigured),
        }
    }

    /// Use `files` to read key files.
    pub fn with_file_read(mut self, files: impl FileRead) -> Self {
        self.files = Arc::new(files);
        self
    }

    /// Use `client` to send token requests.
    pub fn with_http_send(mut self, client: impl HttpSend) -> Self {
        self.client = Arc::new(client);
        self
    }

    /// Use `env` to look up environment variables and the home dir.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Read a whole file.
    #[inline]
    pub async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.files.file_read(path).await
    }

    /// Read a whole file as text, replacing invalid UTF-8.
    pub async fn file_read_as_string(&self, path: &str) -> Result<String> {
        let bytes = self.file_read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to an authorization server.
    #[inline]
    pub async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.client.http_send(req).await
    }

    /// Send a request and return the body as text, replacing invalid UTF-8.
    pub async fn http_send_as_string(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<String>> {
        let (parts, body) = self.http_send(req).await?.into_parts();
        let body = String::from_utf8_lossy(&body).into_owned();
        Ok(http::Response::from_parts(parts, body))
    }

    /// Home directory of the current user.
    #[inline]
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.env.home_dir()
    }

    /// Replace a leading `~` with the home dir.
    ///
    /// Returns `None` only when the path needs expanding and no home dir is known.
    pub fn expand_home_dir(&self, path: &str) -> Option<String> {
        match path.strip_prefix('~') {
            Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => {
                let home = self.home_dir()?;
                Some(format!("{}{rest}", home.to_string_lossy()))
            }
            _ => Some(path.to_string()),
        }
    }

    /// Look up an environment variable.
    ///
    /// Empty values are treated as unset.
    #[inline]
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key).filter(|v| !v.is_empty())
    }

    /// All environment variables as `(name, value)` pairs.
    #[inline]
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env.vars()
    }
}

/// FileRead reads a whole file, e.g. a service account key.
#[async_trait]
pub trait FileRead: Debug + Send + Sync + 'static {
    /// Read the content of `path`.
    async fn file_read(&self, path: &str) -> Result<Vec<u8>>;
}

/// HttpSend sends token, refresh and revocation requests.
///
/// Implementations return every response as is, including non-2xx ones;
/// only transport failures are errors.
#[async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send `req` and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// Env gives access to environment variables and the home dir.
pub trait Env: Debug + Send + Sync + 'static {
    /// Value of `key`, `None` if unset or not valid UTF-8.
    fn var(&self, key: &str) -> Option<String>;

    /// Every variable with a UTF-8 name and value.
    fn vars(&self) -> HashMap<String, String>;

    /// Home dir of the current user, if known.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// OsEnv reads the environment of the current process.
#[derive(Debug, Copy, Clone)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?.into_string().ok()
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        home::home_dir()
    }
}

/// StaticEnv serves a fixed set of variables, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Home dir returned by [`Env::home_dir`].
    pub home_dir: Option<PathBuf>,
    /// Variables returned by [`Env::var`].
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }

    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// Stand-in for every component a [`Context`] was not given.
#[derive(Debug, Clone, Copy)]
struct Unconfigured;

#[async_trait]
impl FileRead for Unconfigured {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        Err(Error::config_invalid(format!(
            "cannot read {path}: no file reader in context"
        )))
    }
}

#[async_trait]
impl HttpSend for Unconfigured {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::config_invalid(format!(
            "cannot send request to {}: no http client in context",
            req.uri()
        )))
    }
}

impl Env for Unconfigured {
    fn var(&self, _: &str) -> Option<String> {
        None
    }

    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}
