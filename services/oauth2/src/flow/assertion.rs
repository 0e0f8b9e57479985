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

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use reqauth_core::time::DateTime;
use reqauth_core::{Error, Result};

use super::ServiceAccountRequest;
use crate::constants::ASSERTION_LIFETIME_SECS;

/// Claims of the JWT assertion exchanged for a service account token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl Claims {
    fn new(req: &ServiceAccountRequest, audience: &str, issued_at: DateTime) -> Self {
        let iat = issued_at.timestamp();

        Claims {
            iss: req.client_email.clone(),
            scope: req.scope.clone(),
            aud: audience.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
            sub: req.subject.clone().filter(|v| !v.is_empty()),
        }
    }
}

/// Sign an RS256 assertion for `req`, addressed to the token endpoint `audience`.
pub fn build_assertion(
    req: &ServiceAccountRequest,
    audience: &str,
    issued_at: DateTime,
) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(req.private_key.as_bytes()).map_err(|e| {
        Error::credential_invalid("failed to parse service account private key").with_source(e)
    })?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = req.private_key_id.clone();

    jsonwebtoken::encode(&header, &Claims::new(req, audience, issued_at), &key)
        .map_err(|e| Error::unexpected("failed to sign JWT assertion").with_source(e))
}
