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

use std::str::FromStr;
use std::time::Duration;

use tf_provider::value::{Value, ValueString};

use crate::ibm_provider::ProviderConfig;

use super::SessionError;

const API_KEY_ENV: &[&str] = &["IC_API_KEY", "IBMCLOUD_API_KEY"];
const IAM_TOKEN_ENV: &[&str] = &["IC_IAM_TOKEN", "IBMCLOUD_IAM_TOKEN"];
const REGION_ENV: &[&str] = &["IC_REGION", "IBMCLOUD_REGION", "BM_REGION", "BLUEMIX_REGION"];
const ZONE_ENV: &[&str] = &["IC_ZONE", "IBMCLOUD_ZONE"];
const RESOURCE_GROUP_ENV: &[&str] = &[
    "IC_RESOURCE_GROUP",
    "IBMCLOUD_RESOURCE_GROUP",
    "BM_RESOURCE_GROUP",
    "BLUEMIX_RESOURCE_GROUP",
];
const VISIBILITY_ENV: &[&str] = &["IC_VISIBILITY", "IBMCLOUD_VISIBILITY"];
const TIMEOUT_ENV: &[&str] = &["IC_TIMEOUT", "IBMCLOUD_TIMEOUT"];

pub const DEFAULT_REGION: &str = "us-south";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    PublicAndPrivate,
}

impl Visibility {
    pub const VALUES: &'static [&'static str] = &["public", "private", "public-and-private"];
}

impl FromStr for Visibility {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "public-and-private" => Ok(Self::PublicAndPrivate),
            _ => Err(SessionError::InvalidConfig(format!(
                "visibility must be one of public, private or public-and-private, got `{s}`"
            ))),
        }
    }
}

/// Resolved settings of the provider block
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api_key: Option<String>,
    pub iam_token: Option<String>,
    pub region: String,
    pub zone: Option<String>,
    pub resource_group: Option<String>,
    pub visibility: Visibility,
    pub timeout: Duration,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("iam_token", &self.iam_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("resource_group", &self.resource_group)
            .field("visibility", &self.visibility)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SessionConfig {
    /// Merge the provider block with the environment.
    ///
    /// Explicit attributes win; otherwise the first non-empty variable of each
    /// list is used.
    pub fn resolve<F>(config: &ProviderConfig<'_>, env: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |value: &ValueString<'_>, names: &[&str]| -> Option<String> {
            value
                .as_deref_option()
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .or_else(|| {
                    names
                        .iter()
                        .find_map(|name| env(*name).filter(|v| !v.is_empty()))
                })
        };

        let visibility = match lookup(&config.visibility, VISIBILITY_ENV) {
            Some(visibility) => visibility.parse()?,
            None => Visibility::default(),
        };

        let timeout = match &config.ibmcloud_timeout {
            Value::Value(secs) => Some(*secs),
            _ => TIMEOUT_ENV
                .iter()
                .find_map(|name| env(*name))
                .map(|secs| {
                    secs.trim().parse::<i64>().map_err(|_| {
                        SessionError::InvalidConfig(format!(
                            "timeout must be a number of seconds, got `{secs}`"
                        ))
                    })
                })
                .transpose()?,
        };
        let timeout = match timeout {
            None => DEFAULT_TIMEOUT,
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            Some(secs) => {
                return Err(SessionError::InvalidConfig(format!(
                    "timeout must be positive, got {secs}"
                )))
            }
        };

        Ok(Self {
            api_key: lookup(&config.ibmcloud_api_key, API_KEY_ENV),
            iam_token: lookup(&config.iam_token, IAM_TOKEN_ENV),
            region: lookup(&config.region, REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            zone: lookup(&config.zone, ZONE_ENV),
            resource_group: lookup(&config.resource_group, RESOURCE_GROUP_ENV),
            visibility,
            timeout,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() || self.iam_token.is_some()
    }

    fn private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn iam_endpoint(&self) -> String {
        if self.private() {
            "https://private.iam.cloud.ibm.com".to_owned()
        } else {
            "https://iam.cloud.ibm.com".to_owned()
        }
    }

    pub fn vpc_endpoint(&self) -> String {
        if self.private() {
            format!("https://{}.private.iaas.cloud.ibm.com/v1", self.region)
        } else {
            format!("https://{}.iaas.cloud.ibm.com/v1", self.region)
        }
    }

    pub fn functions_endpoint(&self) -> String {
        format!("https://{}.functions.cloud.ibm.com/api/v1", self.region)
    }

    pub fn satellite_link_endpoint(&self) -> String {
        if self.private() {
            "https://private.api.link.satellite.cloud.ibm.com/v1".to_owned()
        } else {
            "https://api.link.satellite.cloud.ibm.com/v1".to_owned()
        }
    }
}
