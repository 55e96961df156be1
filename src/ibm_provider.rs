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


use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tf_provider::data_source::DynamicDataSource;
use tf_provider::resource::DynamicResource;
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};
use tf_provider::value::{ValueNumber, ValueString};
use tf_provider::{map, Block, Description, Diagnostics, Provider, Schema, ValueEmpty};
use tracing::{info, warn};

use crate::conns::{ClientSession, SessionConfig, SessionHandle, Visibility};
use crate::functions::{NamespaceLifecycle, NamespaceLookup};
use crate::lifecycle::{LifecycleResource, LookupDataSource};
use crate::satellite::EndpointLifecycle;
use crate::utils::{validate_one_of, validate_range};
use crate::vpc::{VolumeLifecycle, VolumeLookup};

lazy_static! {
    static ref KNOWN_REGIONS: Vec<&'static str> = vec![
        "au-syd", "br-sao", "ca-tor", "eu-de", "eu-es", "eu-gb", "jp-osa", "jp-tok", "us-east",
        "us-south",
    ];
}

/// Attributes of the `provider "ibm"` block
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    pub ibmcloud_api_key: ValueString<'a>,
    pub iam_token: ValueString<'a>,
    pub region: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub resource_group: ValueString<'a>,
    pub visibility: ValueString<'a>,
    pub ibmcloud_timeout: ValueNumber,
}

#[derive(Debug, Default, Clone)]
pub struct IbmProvider {
    session: SessionHandle,
}

fn attribute(
    attr_type: AttributeType,
    description: &str,
    sensitive: bool,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Optional,
        sensitive,
        ..Default::default()
    }
}

#[async_trait]
impl Provider for IbmProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "ibmcloud_api_key" => attribute(
                        AttributeType::String,
                        "IBM Cloud API key, defaults to `IC_API_KEY` or `IBMCLOUD_API_KEY`",
                        true,
                    ),
                    "iam_token" => attribute(
                        AttributeType::String,
                        "IAM access token used instead of the API key, defaults to `IC_IAM_TOKEN` or `IBMCLOUD_IAM_TOKEN`",
                        true,
                    ),
                    "region" => attribute(AttributeType::String, "Region of the services (default `us-south`)", false),
                    "zone" => attribute(AttributeType::String, "Zone of volumes that do not set one", false),
                    "resource_group" => attribute(AttributeType::String, "Resource group id of volumes that do not set one", false),
                    "visibility" => attribute(
                        AttributeType::String,
                        "Service endpoints to use: `public`, `private` or `public-and-private`",
                        false,
                    ),
                    "ibmcloud_timeout" => attribute(
                        AttributeType::Number,
                        "Timeout of API requests in seconds (default 60)",
                        false,
                    ),
                },
                description: Description::plain("IBM Cloud"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        validate_one_of(diags, &config.visibility, Visibility::VALUES, "visibility");
        validate_range(diags, &config.ibmcloud_timeout, 1..=3600, "ibmcloud_timeout");

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let config = match SessionConfig::resolve(&config, |name| std::env::var(name).ok()) {
            Ok(config) => config,
            Err(err) => {
                diags.root_error("Invalid provider configuration", err.to_string());
                return None;
            }
        };

        if !KNOWN_REGIONS.contains(&config.region.as_str()) {
            warn!(region = %config.region, "unknown region");
            diags.root_warning(
                "Unknown region",
                format!(
                    "`{}` is not a known IBM Cloud region, service endpoints may not resolve",
                    config.region
                ),
            );
        }
        if !config.has_credentials() {
            warn!("no IBM Cloud credentials configured");
        }

        let session = match ClientSession::new(config) {
            Ok(session) => session,
            Err(err) => {
                diags.root_error("Could not create the IBM Cloud session", err.to_string());
                return None;
            }
        };
        info!(
            %terraform_version,
            region = %session.config().region,
            "provider configured"
        );
        *self.session.write().await = Some(Arc::new(session));
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "is_volume" => LifecycleResource::new(VolumeLifecycle, self.session.clone()),
            "function_namespace" => LifecycleResource::new(NamespaceLifecycle, self.session.clone()),
            "satellite_endpoint" => LifecycleResource::new(EndpointLifecycle, self.session.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "is_volume" => LookupDataSource::new(VolumeLookup, self.session.clone()),
            "function_namespace" => LookupDataSource::new(NamespaceLookup, self.session.clone()),
        })
    }
}
