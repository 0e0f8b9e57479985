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

use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Error returned by every reqauth operation.
///
/// Besides a kind and a message, errors coming back from an authorization
/// server keep the OAuth2 `error` code and the HTTP status so callers can
/// tell an `invalid_grant` from a transient outage.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    code: Option<String>,
    status: Option<StatusCode>,
    #[source]
    source: Option<anyhow::Error>,
}

/// ErrorKind classifies an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required field is missing or blank; nothing was sent.
    ParameterMissing,
    /// A token, key or other credential material cannot be used.
    CredentialInvalid,
    /// The authorization server rejected a request or could not be reached.
    TokenRequestFailed,
    /// An outgoing request could not be built.
    RequestInvalid,
    /// The configuration or context is unusable.
    ConfigInvalid,
    /// Anything else.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ParameterMissing => "parameter missing",
            ErrorKind::CredentialInvalid => "credential invalid",
            ErrorKind::TokenRequestFailed => "token request failed",
            ErrorKind::RequestInvalid => "request invalid",
            ErrorKind::ConfigInvalid => "config invalid",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Create an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status: None,
            source: None,
        }
    }

    /// A required field is missing, e.g. `client_secret is required`.
    pub fn parameter_missing(field: &str) -> Self {
        Self::new(ErrorKind::ParameterMissing, format!("{field} is required"))
    }

    /// Shorthand for [`ErrorKind::CredentialInvalid`].
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Shorthand for [`ErrorKind::TokenRequestFailed`].
    pub fn token_request_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenRequestFailed, message)
    }

    /// Shorthand for [`ErrorKind::RequestInvalid`].
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Shorthand for [`ErrorKind::ConfigInvalid`].
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Shorthand for [`ErrorKind::Unexpected`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Set the underlying cause.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the OAuth2 error code, e.g. `invalid_grant`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the HTTP status of the failed response.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// OAuth2 error code returned by the server, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// HTTP status returned by the server, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

/// Result with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid("failed to build http request").with_source(err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid("invalid header value").with_source(err)
    }
}
