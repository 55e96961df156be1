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
use futures::{stream, TryStreamExt};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::conns::{ApiError, RestClient};

const PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateNamespace {
    pub name: String,
    pub resource_group_id: String,
    pub resource_plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NamespacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct NamespacePage {
    #[serde(default)]
    namespaces: Vec<Namespace>,
    #[serde(default)]
    total_count: usize,
}

/// IBM Cloud Functions namespaces
#[async_trait]
pub trait FunctionsApi: Send + Sync {
    async fn create_namespace(&self, request: &CreateNamespace) -> Result<Namespace, ApiError>;
    async fn get_namespace(&self, id: &str) -> Result<Namespace, ApiError>;
    async fn update_namespace(&self, id: &str, patch: &NamespacePatch) -> Result<Namespace, ApiError>;
    async fn delete_namespace(&self, id: &str) -> Result<(), ApiError>;
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct FunctionsClient {
    rest: RestClient,
    endpoint: String,
}

impl FunctionsClient {
    pub(crate) fn new(rest: RestClient, endpoint: String) -> Self {
        Self { rest, endpoint }
    }

    fn url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/namespaces/{}", self.endpoint, urlencoding::encode(id)),
            None => format!("{}/namespaces", self.endpoint),
        }
    }
}

#[async_trait]
impl FunctionsApi for FunctionsClient {
    async fn create_namespace(&self, request: &CreateNamespace) -> Result<Namespace, ApiError> {
        self.rest
            .json(self.rest.request(Method::POST, &self.url(None)).json(request))
            .await
    }

    async fn get_namespace(&self, id: &str) -> Result<Namespace, ApiError> {
        self.rest
            .json(self.rest.request(Method::GET, &self.url(Some(id))))
            .await
    }

    async fn update_namespace(&self, id: &str, patch: &NamespacePatch) -> Result<Namespace, ApiError> {
        self.rest
            .json(self.rest.request(Method::PATCH, &self.url(Some(id))).json(patch))
            .await
    }

    async fn delete_namespace(&self, id: &str) -> Result<(), ApiError> {
        self.rest
            .empty(self.rest.request(Method::DELETE, &self.url(Some(id))))
            .await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ApiError> {
        let url = self.url(None);
        stream::try_unfold(Some(0usize), |offset| {
            let url = url.clone();
            async move {
                let Some(offset) = offset else {
                    return Ok(None);
                };
                let page: NamespacePage = self
                    .rest
                    .json(
                        self.rest
                            .request(Method::GET, &url)
                            .query(&[("limit", PAGE_SIZE), ("offset", offset)]),
                    )
                    .await?;
                let seen = offset + page.namespaces.len();
                let next = (!page.namespaces.is_empty() && seen < page.total_count).then_some(seen);
                Ok(Some((page.namespaces, next)))
            }
        })
        .try_concat()
        .await
    }
}
