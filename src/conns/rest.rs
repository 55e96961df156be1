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

use std::sync::Arc;

use reqwest::{header::ACCEPT, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::trace;

use super::{iam::Authenticator, ApiError};

/// Authenticated JSON client shared by every service client
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    auth: Arc<Authenticator>,
}

impl RestClient {
    pub(crate) fn new(http: reqwest::Client, auth: Arc<Authenticator>) -> Self {
        Self { http, auth }
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        trace!(%method, url, "preparing request");
        self.http
            .request(method, url)
            .header(ACCEPT, "application/json")
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.auth.bearer().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        Ok(self.execute(request).await?.json().await?)
    }

    pub(crate) async fn empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.execute(request).await.map(drop)
    }
}
