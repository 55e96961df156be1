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


use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::conns::{ApiError, RestClient};

/// Satellite Link endpoint as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub location_id: Option<String>,
    pub endpoint_id: String,
    #[serde(default)]
    pub conn_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub server_host: Option<String>,
    #[serde(default)]
    pub server_port: Option<i64>,
    #[serde(default)]
    pub sni: Option<String>,
    #[serde(default)]
    pub client_protocol: Option<String>,
    #[serde(default)]
    pub client_mutual_auth: Option<bool>,
    #[serde(default)]
    pub server_protocol: Option<String>,
    #[serde(default)]
    pub server_mutual_auth: Option<bool>,
    #[serde(default)]
    pub reject_unauth: Option<bool>,
    #[serde(default)]
    pub timeout: Option<i64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub client_host: Option<String>,
    #[serde(default)]
    pub client_port: Option<i64>,
    #[serde(default)]
    pub connector_port: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_change: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointPrototype {
    pub conn_type: String,
    pub display_name: String,
    pub server_host: String,
    pub server_port: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    pub client_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_mutual_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_mutual_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_unauth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_mutual_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_mutual_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_unauth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

impl EndpointPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Satellite Link endpoints, scoped by location
#[async_trait]
pub trait SatelliteApi: Send + Sync {
    async fn create_endpoint(
        &self,
        location: &str,
        prototype: &EndpointPrototype,
    ) -> Result<Endpoint, ApiError>;
    async fn get_endpoint(&self, location: &str, endpoint: &str) -> Result<Endpoint, ApiError>;
    async fn update_endpoint(
        &self,
        location: &str,
        endpoint: &str,
        patch: &EndpointPatch,
    ) -> Result<Endpoint, ApiError>;
    async fn delete_endpoint(&self, location: &str, endpoint: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct SatelliteClient {
    rest: RestClient,
    endpoint: String,
}

impl SatelliteClient {
    pub(crate) fn new(rest: RestClient, endpoint: String) -> Self {
        Self { rest, endpoint }
    }

    fn url(&self, location: &str, endpoint: Option<&str>) -> String {
        let mut url = format!(
            "{}/locations/{}/endpoints",
            self.endpoint,
            urlencoding::encode(location)
        );
        if let Some(endpoint) = endpoint {
            url.push('/');
            url.push_str(&urlencoding::encode(endpoint));
        }
        url
    }
}

#[async_trait]
impl SatelliteApi for SatelliteClient {
    async fn create_endpoint(
        &self,
        location: &str,
        prototype: &EndpointPrototype,
    ) -> Result<Endpoint, ApiError> {
        self.rest
            .json(
                self.rest
                    .request(Method::POST, &self.url(location, None))
                    .json(prototype),
            )
            .await
    }

    async fn get_endpoint(&self, location: &str, endpoint: &str) -> Result<Endpoint, ApiError> {
        self.rest
            .json(
                self.rest
                    .request(Method::GET, &self.url(location, Some(endpoint))),
            )
            .await
    }

    async fn update_endpoint(
        &self,
        location: &str,
        endpoint: &str,
        patch: &EndpointPatch,
    ) -> Result<Endpoint, ApiError> {
        self.rest
            .json(
                self.rest
                    .request(Method::PATCH, &self.url(location, Some(endpoint)))
                    .json(patch),
            )
            .await
    }

    async fn delete_endpoint(&self, location: &str, endpoint: &str) -> Result<(), ApiError> {
        self.rest
            .empty(
                self.rest
                    .request(Method::DELETE, &self.url(location, Some(endpoint))),
            )
            .await
    }
}
