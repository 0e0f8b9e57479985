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

use serde::Deserialize;

/// Successful response of the token endpoint, for every grant type.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token issued by the authorization server.
    pub access_token: String,

    /// Only returned by the authorization code grant and some refresh grants.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// The lifetime in seconds of the access token.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// The type of token issued, typically `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,

    /// Granted scopes, space separated.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error response body defined by RFC 6749 section 5.2.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code such as `invalid_grant`.
    pub error: String,

    /// Human readable explanation.
    #[serde(default)]
    pub error_description: Option<String>,
}
