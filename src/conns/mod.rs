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

use tokio::sync::RwLock;

use crate::functions::client::{FunctionsApi, FunctionsClient};
use crate::satellite::client::{SatelliteApi, SatelliteClient};
use crate::vpc::client::{VpcApi, VpcClient};

mod config;
mod error;
#[cfg(test)]
pub mod fake;
mod iam;
mod rest;

pub use config::{SessionConfig, Visibility};
pub use error::{ApiError, SessionError};
pub(crate) use rest::RestClient;

/// Session shared between the provider and every resource.
///
/// It is empty until the provider has been configured.
pub type SessionHandle = Arc<RwLock<Option<Arc<ClientSession>>>>;

/// Factory of the per-service clients
pub struct ClientSession {
    config: SessionConfig,
    vpc: Arc<dyn VpcApi>,
    functions: Arc<dyn FunctionsApi>,
    satellite: Arc<dyn SatelliteApi>,
}

impl ClientSession {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("terraform-provider-ibm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let auth = Arc::new(iam::Authenticator::new(http.clone(), &config));
        let rest = RestClient::new(http, auth);

        Ok(Self {
            vpc: Arc::new(VpcClient::new(rest.clone(), config.vpc_endpoint())),
            functions: Arc::new(FunctionsClient::new(
                rest.clone(),
                config.functions_endpoint(),
            )),
            satellite: Arc::new(SatelliteClient::new(rest, config.satellite_link_endpoint())),
            config,
        })
    }

    /// Build a session out of already constructed clients
    #[cfg(test)]
    pub fn with_clients(
        config: SessionConfig,
        vpc: Arc<dyn VpcApi>,
        functions: Arc<dyn FunctionsApi>,
        satellite: Arc<dyn SatelliteApi>,
    ) -> Self {
        Self {
            config,
            vpc,
            functions,
            satellite,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn ensure_credentials(&self, service: &'static str) -> Result<(), SessionError> {
        if self.config.has_credentials() {
            Ok(())
        } else {
            Err(SessionError::MissingCredentials(service))
        }
    }

    pub fn vpc(&self) -> Result<Arc<dyn VpcApi>, SessionError> {
        self.ensure_credentials("VPC")?;
        Ok(self.vpc.clone())
    }

    pub fn functions(&self) -> Result<Arc<dyn FunctionsApi>, SessionError> {
        self.ensure_credentials("Cloud Functions")?;
        Ok(self.functions.clone())
    }

    pub fn satellite(&self) -> Result<Arc<dyn SatelliteApi>, SessionError> {
        self.ensure_credentials("Satellite Link")?;
        Ok(self.satellite.clone())
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
