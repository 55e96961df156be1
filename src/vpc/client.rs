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
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::conns::{ApiError, RestClient};

const API_VERSION: &str = "2024-04-30";
const PAGE_LIMIT: &str = "100";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdReference {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrnReference {
    pub crn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReason {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,
}

/// Block storage volume as returned by the VPC API
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub iops: Option<i64>,
    #[serde(default)]
    pub bandwidth: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_reasons: Vec<StatusReason>,
    #[serde(default)]
    pub health_state: Option<String>,
    #[serde(default)]
    pub encryption: Option<String>,
    #[serde(default)]
    pub encryption_key: Option<CrnReference>,
    #[serde(default)]
    pub profile: Option<NameReference>,
    #[serde(default)]
    pub zone: Option<NameReference>,
    #[serde(default)]
    pub resource_group: Option<IdReference>,
    #[serde(default)]
    pub source_snapshot: Option<IdReference>,
    #[serde(default)]
    pub user_tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumePrototype {
    pub name: String,
    pub profile: NameReference,
    pub zone: NameReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<CrnReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<IdReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_tags: Vec<String>,
}

/// JSON merge patch of a volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VolumePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_tags: Option<Vec<String>>,
}

impl VolumePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The volume goes through `updating` after this patch
    pub fn resizes(&self) -> bool {
        self.capacity.is_some() || self.iops.is_some() || self.profile.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct Next {
    href: String,
}

#[derive(Debug, Deserialize)]
struct VolumeCollection {
    #[serde(default)]
    volumes: Vec<Volume>,
    #[serde(default)]
    next: Option<Next>,
}

/// Extract the `start` token of the next page
fn start_token(href: &str) -> Option<String> {
    let query = href.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "start")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}

/// VPC Infrastructure block storage
#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn create_volume(&self, prototype: &VolumePrototype) -> Result<Volume, ApiError>;
    async fn get_volume(&self, id: &str) -> Result<Volume, ApiError>;
    async fn update_volume(&self, id: &str, patch: &VolumePatch) -> Result<Volume, ApiError>;
    async fn delete_volume(&self, id: &str) -> Result<(), ApiError>;
    async fn list_volumes(&self, name: Option<&str>) -> Result<Vec<Volume>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct VpcClient {
    rest: RestClient,
    endpoint: String,
}

impl VpcClient {
    pub(crate) fn new(rest: RestClient, endpoint: String) -> Self {
        Self { rest, endpoint }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.rest
            .request(method, &format!("{}{path}", self.endpoint))
            .query(&[("version", API_VERSION), ("generation", "2")])
    }

    fn volume_path(id: &str) -> String {
        format!("/volumes/{}", urlencoding::encode(id))
    }
}

#[async_trait]
impl VpcApi for VpcClient {
    async fn create_volume(&self, prototype: &VolumePrototype) -> Result<Volume, ApiError> {
        self.rest
            .json(self.request(Method::POST, "/volumes").json(prototype))
            .await
    }

    async fn get_volume(&self, id: &str) -> Result<Volume, ApiError> {
        self.rest
            .json(self.request(Method::GET, &Self::volume_path(id)))
            .await
    }

    async fn update_volume(&self, id: &str, patch: &VolumePatch) -> Result<Volume, ApiError> {
        let body = serde_json::to_vec(patch)?;
        self.rest
            .json(
                self.request(Method::PATCH, &Self::volume_path(id))
                    .header(CONTENT_TYPE, "application/merge-patch+json")
                    .body(body),
            )
            .await
    }

    async fn delete_volume(&self, id: &str) -> Result<(), ApiError> {
        self.rest
            .empty(self.request(Method::DELETE, &Self::volume_path(id)))
            .await
    }

    async fn list_volumes(&self, name: Option<&str>) -> Result<Vec<Volume>, ApiError> {
        stream::try_unfold(Some(None::<String>), |start| async move {
            let Some(start) = start else {
                return Ok(None);
            };
            let mut request = self
                .request(Method::GET, "/volumes")
                .query(&[("limit", PAGE_LIMIT)]);
            if let Some(name) = name {
                request = request.query(&[("name", name)]);
            }
            if let Some(start) = &start {
                request = request.query(&[("start", start.as_str())]);
            }
            let page: VolumeCollection = self.rest.json(request).await?;
            let next = page.next.and_then(|next| start_token(&next.href));
            Ok(Some((page.volumes, next.map(Some))))
        })
        .try_concat()
        .await
    }
}
