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
use std::time::Duration;

use async_trait::async_trait;
use tf_provider::{AttributePath, Diagnostics};

use crate::conns::{ClientSession, SessionConfig, SessionError};
use crate::flex;
use crate::identifier::{join_parts, split_parts, IdError, ResourceId};
use crate::lifecycle::{not_found_as_none, Error, Lifecycle};
use crate::timeouts::Timeouts;

use super::client::{Endpoint, EndpointPatch, EndpointPrototype, SatelliteApi};
use super::state::EndpointState;

/// `<location>/<endpoint_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointId {
    pub location: String,
    pub endpoint: String,
}

impl ResourceId for EndpointId {
    fn encode(&self) -> String {
        join_parts([self.location.as_str(), self.endpoint.as_str()])
    }

    fn decode(id: &str) -> Result<Self, IdError> {
        let [location, endpoint] = split_parts::<2>(id)?;
        Ok(Self { location, endpoint })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub location: String,
    pub connection_type: String,
    pub display_name: String,
    pub server_host: String,
    pub server_port: i64,
    pub sni: Option<String>,
    pub client_protocol: String,
    pub client_mutual_auth: Option<bool>,
    pub server_protocol: Option<String>,
    pub server_mutual_auth: Option<bool>,
    pub reject_unauth: Option<bool>,
    pub timeout: Option<i64>,
    pub created_by: Option<String>,
}

impl EndpointSpec {
    fn prototype(&self) -> EndpointPrototype {
        EndpointPrototype {
            conn_type: self.connection_type.clone(),
            display_name: self.display_name.clone(),
            server_host: self.server_host.clone(),
            server_port: self.server_port,
            sni: self.sni.clone(),
            client_protocol: self.client_protocol.clone(),
            client_mutual_auth: self.client_mutual_auth,
            server_protocol: self.server_protocol.clone(),
            server_mutual_auth: self.server_mutual_auth,
            reject_unauth: self.reject_unauth,
            timeout: self.timeout,
            created_by: self.created_by.clone(),
        }
    }

    /// Patch turning `self` into `planned`.
    ///
    /// Optional attributes removed from the configuration are left as they are
    /// remotely, except `sni` which is cleared.
    fn patch(&self, planned: &Self) -> EndpointPatch {
        fn changed<T: Clone + PartialEq>(prior: &T, planned: &T) -> Option<T> {
            (prior != planned).then(|| planned.clone())
        }
        fn changed_opt<T: Clone + PartialEq>(prior: &Option<T>, planned: &Option<T>) -> Option<T> {
            planned.clone().filter(|_| prior != planned)
        }

        EndpointPatch {
            display_name: changed(&self.display_name, &planned.display_name),
            server_host: changed(&self.server_host, &planned.server_host),
            server_port: changed(&self.server_port, &planned.server_port),
            sni: changed(&self.sni, &planned.sni).map(Option::unwrap_or_default),
            client_protocol: changed(&self.client_protocol, &planned.client_protocol),
            client_mutual_auth: changed_opt(&self.client_mutual_auth, &planned.client_mutual_auth),
            server_protocol: changed_opt(&self.server_protocol, &planned.server_protocol),
            server_mutual_auth: changed_opt(&self.server_mutual_auth, &planned.server_mutual_auth),
            reject_unauth: changed_opt(&self.reject_unauth, &planned.reject_unauth),
            timeout: changed_opt(&self.timeout, &planned.timeout),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EndpointLifecycle;

#[async_trait]
impl Lifecycle for EndpointLifecycle {
    const KIND: &'static str = "satellite endpoint";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(600));

    type Client = dyn SatelliteApi;
    type Id = EndpointId;
    type Spec = EndpointSpec;
    type Remote = Endpoint;
    type State<'a> = EndpointState<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError> {
        session.satellite()
    }

    fn expand(
        state: &EndpointState<'_>,
        _provider: &SessionConfig,
        diags: &mut Diagnostics,
    ) -> Option<EndpointSpec> {
        let location = flex::required_string(&state.location, diags, "location");
        let connection_type = flex::required_string(&state.connection_type, diags, "connection_type");
        let display_name = flex::required_string(&state.display_name, diags, "display_name");
        let server_host = flex::required_string(&state.server_host, diags, "server_host");
        let client_protocol = flex::required_string(&state.client_protocol, diags, "client_protocol");
        let server_port = flex::expand_number(&state.server_port);
        if server_port.is_none() {
            diags.error(
                "Missing `server_port`",
                "`server_port` must be known when applying",
                AttributePath::new("server_port"),
            );
        }

        Some(EndpointSpec {
            location: location?,
            connection_type: connection_type?,
            display_name: display_name?,
            server_host: server_host?,
            server_port: server_port?,
            sni: flex::expand_string(&state.sni),
            client_protocol: client_protocol?,
            client_mutual_auth: flex::expand_bool(&state.client_mutual_auth),
            server_protocol: flex::expand_string(&state.server_protocol),
            server_mutual_auth: flex::expand_bool(&state.server_mutual_auth),
            reject_unauth: flex::expand_bool(&state.reject_unauth),
            timeout: flex::expand_number(&state.timeout),
            created_by: flex::expand_string(&state.created_by),
        })
    }

    fn flatten(state: &mut EndpointState<'_>, remote: Endpoint) {
        state.flatten(remote);
    }

    async fn create(
        &self,
        client: &dyn SatelliteApi,
        spec: &EndpointSpec,
        _timeouts: &Timeouts,
    ) -> Result<EndpointId, Error> {
        let endpoint = client
            .create_endpoint(&spec.location, &spec.prototype())
            .await?;
        Ok(EndpointId {
            location: endpoint
                .location_id
                .unwrap_or_else(|| spec.location.clone()),
            endpoint: endpoint.endpoint_id,
        })
    }

    async fn read(
        &self,
        client: &dyn SatelliteApi,
        id: &EndpointId,
    ) -> Result<Option<Endpoint>, Error> {
        let endpoint = not_found_as_none(client.get_endpoint(&id.location, &id.endpoint).await)?;
        Ok(endpoint.map(|mut endpoint| {
            endpoint
                .location_id
                .get_or_insert_with(|| id.location.clone());
            endpoint
        }))
    }

    async fn update(
        &self,
        client: &dyn SatelliteApi,
        id: &EndpointId,
        prior: &EndpointSpec,
        planned: &EndpointSpec,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        let patch = prior.patch(planned);
        if !patch.is_empty() {
            client
                .update_endpoint(&id.location, &id.endpoint, &patch)
                .await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn SatelliteApi,
        id: &EndpointId,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        Ok(not_found_as_none(client.delete_endpoint(&id.location, &id.endpoint).await).map(drop)?)
    }
}
