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

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Response};
use log::{debug, error};
use serde::de::DeserializeOwned;

use reqauth_core::time::DateTime;
use reqauth_core::{Context, Error, Result};

use super::types::{ErrorResponse, TokenResponse};
use crate::constants::FORM_CONTENT_TYPE;
use crate::credential::Token;

/// Encode `params` as `application/x-www-form-urlencoded`.
pub fn encode_form(params: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Send a form encoded POST and return the raw response once it is known to be successful.
///
/// Non-2xx responses are turned into a `TokenRequestFailed` error carrying the
/// OAuth2 error code, if the body has one, and the HTTP status.
pub async fn form_post(
    ctx: &Context,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Response<Bytes>> {
    let req = http::Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .header(ACCEPT, "application/json")
        .body(Bytes::from(encode_form(params)))
        .map_err(|e| Error::request_invalid("failed to build token request").with_source(e))?;

    debug!("sending OAuth2 request to {url}");
    let resp = ctx.http_send(req).await?;

    if !resp.status().is_success() {
        error!("OAuth2 request to {url} failed with status {}", resp.status());
        return Err(error_from_response(&resp));
    }

    Ok(resp)
}

/// Send a form encoded POST and parse the JSON body of a successful response.
pub async fn form_post_json<R: DeserializeOwned>(
    ctx: &Context,
    url: &str,
    params: &[(&str, &str)],
) -> Result<R> {
    let resp = form_post(ctx, url, params).await?;
    serde_json::from_slice(resp.body())
        .map_err(|e| Error::unexpected("failed to parse OAuth2 response").with_source(e))
}

/// Build an error out of a failed token endpoint response.
pub fn error_from_response(resp: &Response<Bytes>) -> Error {
    let status = resp.status();
    match serde_json::from_slice::<ErrorResponse>(resp.body()) {
        Ok(body) => {
            let message = match &body.error_description {
                Some(desc) => format!("{}: {desc}", body.error),
                None => body.error.clone(),
            };
            Error::token_request_failed(message)
                .with_code(body.error)
                .with_status(status)
        }
        Err(_) => Error::token_request_failed(format!("token endpoint returned {status}"))
            .with_status(status),
    }
}

/// Convert a token endpoint response into a [`Token`] issued at `issued_at`.
pub fn token_from_response(resp: TokenResponse, issued_at: DateTime) -> Token {
    Token {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token,
        expires_in: resp.expires_in,
        token_type: resp.token_type,
        scope: resp.scope,
        issued_at,
    }
}
