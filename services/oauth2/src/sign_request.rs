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
use http::header::AUTHORIZATION;
use http::HeaderValue;
use log::debug;

use reqauth_core::{Context, Error, Result, SignRequest};

use crate::credential::CredentialState;

/// Build a sensitive `Bearer <token>` header value.
pub fn bearer_header(access_token: &str) -> Result<HeaderValue> {
    if access_token.is_empty() {
        return Err(Error::credential_invalid("access token is empty"));
    }

    let mut value: HeaderValue = format!("Bearer {access_token}").parse()?;
    value.set_sensitive(true);
    Ok(value)
}

/// BearerSigner inserts the access token as an `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerSigner;

#[async_trait]
impl SignRequest for BearerSigner {
    type Credential = CredentialState;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid("no OAuth2 credential available"));
        };

        debug!("signing request to {} with bearer token", req.uri);
        req.headers
            .insert(AUTHORIZATION, bearer_header(&cred.access_token)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqauth_core::ErrorKind;

    fn parts() -> http::request::Parts {
        http::Request::builder()
            .uri("https://www.googleapis.com/drive/v3/files")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_bearer_header() {
        let value = bearer_header("ya29.token").unwrap();
        assert_eq!(value, "Bearer ya29.token");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_header_rejects_invalid_values() {
        assert_eq!(
            bearer_header("").unwrap_err().kind(),
            ErrorKind::CredentialInvalid
        );
        assert!(bearer_header("bad\ntoken").is_err());
    }

    #[tokio::test]
    async fn test_sign_request() {
        let cred = CredentialState {
            access_token: "ya29.token".to_string(),
            ..Default::default()
        };
        let mut req = parts();

        BearerSigner
            .sign_request(&Context::new(), &mut req, Some(&cred))
            .await
            .unwrap();
        assert_eq!(req.headers[AUTHORIZATION], "Bearer ya29.token");
    }

    #[tokio::test]
    async fn test_sign_request_without_credential() {
        let mut req = parts();
        let err = BearerSigner
            .sign_request(&Context::new(), &mut req, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }
}
