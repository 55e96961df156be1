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
use tf_provider::Diagnostics;

use crate::conns::{ApiError, ClientSession, SessionConfig, SessionError};
use crate::flex;
use crate::identifier::OpaqueId;
use crate::lifecycle::{not_found_as_none, Error, Lifecycle, Lookup};
use crate::timeouts::Timeouts;

use super::client::{CreateNamespace, FunctionsApi, Namespace, NamespacePatch};
use super::state::{NamespaceDataState, NamespaceState, DEFAULT_PLAN};

/// Spec of a namespace, as sent to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSpec {
    pub name: String,
    pub description: Option<String>,
    pub resource_group_id: String,
    pub resource_plan_id: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NamespaceLifecycle;

#[async_trait]
impl Lifecycle for NamespaceLifecycle {
    const KIND: &'static str = "function namespace";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(300));

    type Client = dyn FunctionsApi;
    type Id = OpaqueId;
    type Spec = NamespaceSpec;
    type Remote = Namespace;
    type State<'a> = NamespaceState<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError> {
        session.functions()
    }

    fn expand(
        state: &NamespaceState<'_>,
        _provider: &SessionConfig,
        diags: &mut Diagnostics,
    ) -> Option<NamespaceSpec> {
        let name = flex::required_string(&state.name, diags, "name");
        let resource_group_id =
            flex::required_string(&state.resource_group_id, diags, "resource_group_id");
        Some(NamespaceSpec {
            name: name?,
            description: flex::expand_string(&state.description),
            resource_group_id: resource_group_id?,
            resource_plan_id: flex::expand_string(&state.resource_plan_id)
                .unwrap_or_else(|| DEFAULT_PLAN.to_owned()),
        })
    }

    fn flatten(state: &mut NamespaceState<'_>, remote: Namespace) {
        state.flatten(remote);
    }

    async fn create(
        &self,
        client: &dyn FunctionsApi,
        spec: &NamespaceSpec,
        _timeouts: &Timeouts,
    ) -> Result<OpaqueId, Error> {
        let namespace = client
            .create_namespace(&CreateNamespace {
                name: spec.name.clone(),
                resource_group_id: spec.resource_group_id.clone(),
                resource_plan_id: spec.resource_plan_id.clone(),
                description: spec.description.clone(),
            })
            .await?;
        Ok(OpaqueId(namespace.id))
    }

    async fn read(
        &self,
        client: &dyn FunctionsApi,
        id: &OpaqueId,
    ) -> Result<Option<Namespace>, Error> {
        Ok(not_found_as_none(client.get_namespace(id.as_str()).await)?)
    }

    async fn update(
        &self,
        client: &dyn FunctionsApi,
        id: &OpaqueId,
        prior: &NamespaceSpec,
        planned: &NamespaceSpec,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        let mut patch = NamespacePatch::default();
        if prior.name != planned.name {
            patch.name = Some(planned.name.clone());
        }
        if prior.description != planned.description {
            patch.description = Some(planned.description.clone().unwrap_or_default());
        }
        if !patch.is_empty() {
            client.update_namespace(id.as_str(), &patch).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn FunctionsApi,
        id: &OpaqueId,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        Ok(not_found_as_none(client.delete_namespace(id.as_str()).await).map(drop)?)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NamespaceLookup;

#[async_trait]
impl Lookup for NamespaceLookup {
    const KIND: &'static str = "function namespace";
    const KEY: &'static str = "name";

    type Client = dyn FunctionsApi;
    type Remote = Namespace;
    type State<'a> = NamespaceDataState<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError> {
        session.functions()
    }

    fn key(state: &NamespaceDataState<'_>, diags: &mut Diagnostics) -> Option<String> {
        flex::required_string(&state.name, diags, Self::KEY)
    }

    async fn find(
        &self,
        client: &dyn FunctionsApi,
        name: &str,
    ) -> Result<Option<Namespace>, ApiError> {
        Ok(client
            .list_namespaces()
            .await?
            .into_iter()
            .find(|namespace| namespace.name.as_deref() == Some(name)))
    }

    fn flatten(state: &mut NamespaceDataState<'_>, remote: Namespace) {
        state.flatten(remote);
    }
}
