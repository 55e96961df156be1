// This file is part of the terraform-provider-ibm project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use reqwest::header::ACCEPT;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ApiError, SessionConfig};

const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Tokens are renewed this many seconds before they expire
const EXPIRATION_MARGIN: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expiration: i64,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expiration: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expiration - EXPIRATION_MARGIN > now
    }
}

/// Hands out IAM bearer tokens, exchanging the API key when needed
pub(crate) struct Authenticator {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    static_token: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl Authenticator {
    pub(crate) fn new(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            endpoint: config.iam_endpoint(),
            api_key: config.api_key.clone(),
            static_token: config
                .iam_token
                .as_deref()
                .map(|token| token.trim_start_matches("Bearer ").to_owned()),
            cached: Mutex::new(None),
        }
    }

    pub(crate) async fn bearer(&self) -> Result<String, ApiError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ApiError::Auth("no API key configured".to_owned()));
        };

        let mut cached = self.cached.lock().await;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        debug!(endpoint = %self.endpoint, "requesting IAM access token");
        let response = self
            .http
            .post(format!("{}/identity/token", self.endpoint))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", APIKEY_GRANT_TYPE), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(
                ApiError::from_body(status.as_u16(), &body).to_string(),
            ));
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expiration: token.expiration,
        });
        Ok(access_token)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
