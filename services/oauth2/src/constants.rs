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

use std::time::Duration;

// Env values used by the OAuth2 config.
pub const OAUTH2_CLIENT_ID: &str = "OAUTH2_CLIENT_ID";
pub const OAUTH2_CLIENT_SECRET: &str = "OAUTH2_CLIENT_SECRET";
pub const OAUTH2_SCOPE: &str = "OAUTH2_SCOPE";
pub const OAUTH2_REDIRECT_URI: &str = "OAUTH2_REDIRECT_URI";
pub const OAUTH2_REFRESH_TOKEN: &str = "OAUTH2_REFRESH_TOKEN";
pub const OAUTH2_ACCESS_TOKEN: &str = "OAUTH2_ACCESS_TOKEN";
pub const OAUTH2_SERVICE_ACCOUNT_EMAIL: &str = "OAUTH2_SERVICE_ACCOUNT_EMAIL";
pub const OAUTH2_PRIVATE_KEY: &str = "OAUTH2_PRIVATE_KEY";
pub const OAUTH2_DELEGATED_ACCOUNT: &str = "OAUTH2_DELEGATED_ACCOUNT";
pub const OAUTH2_MODE: &str = "OAUTH2_MODE";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

// Default endpoints, Google's authorization server.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Access tokens are refreshed once they are within this window of expiring.
pub const DEFAULT_EXPIRY_CUTOFF: Duration = Duration::from_secs(60);

/// Lifetime of a signed service account assertion.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

// Grant types.
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
