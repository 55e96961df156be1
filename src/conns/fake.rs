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

//! In-memory service clients for tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::functions::client::{CreateNamespace, FunctionsApi, Namespace, NamespacePatch};
use crate::satellite::client::{Endpoint, EndpointPatch, EndpointPrototype, SatelliteApi};
use crate::vpc::client::{
    IdReference, StatusReason, Volume, VolumePatch, VolumePrototype, VpcApi,
};

use super::{ApiError, ClientSession, SessionConfig, SessionHandle, Visibility};

pub fn config() -> SessionConfig {
    SessionConfig {
        api_key: Some("fake-api-key".to_owned()),
        iam_token: None,
        region: "us-south".to_owned(),
        zone: None,
        resource_group: None,
        visibility: Visibility::default(),
        timeout: Duration::from_secs(60),
    }
}

pub fn session(
    vpc: Arc<FakeVpc>,
    functions: Arc<FakeFunctions>,
    satellite: Arc<FakeSatellite>,
) -> SessionHandle {
    session_from(config(), vpc, functions, satellite)
}

/// Session carrying custom provider settings
pub fn session_from(
    config: SessionConfig,
    vpc: Arc<FakeVpc>,
    functions: Arc<FakeFunctions>,
    satellite: Arc<FakeSatellite>,
) -> SessionHandle {
    Arc::new(RwLock::new(Some(Arc::new(ClientSession::with_clients(
        config, vpc, functions, satellite,
    )))))
}

pub fn session_with_vpc(vpc: Arc<FakeVpc>) -> SessionHandle {
    session(vpc, Default::default(), Default::default())
}

pub fn session_with_functions(functions: Arc<FakeFunctions>) -> SessionHandle {
    session(Default::default(), functions, Default::default())
}

pub fn session_with_satellite(satellite: Arc<FakeSatellite>) -> SessionHandle {
    session(Default::default(), Default::default(), satellite)
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::status(404, format!("{what} `{id}` not found"))
}

/// Failure injected into every request
#[derive(Debug, Default)]
struct Failure(Mutex<Option<u16>>);

impl Failure {
    fn set(&self, status: u16) {
        *self.0.lock().unwrap() = Some(status);
    }

    fn check(&self) -> Result<(), ApiError> {
        match *self.0.lock().unwrap() {
            Some(status) => Err(ApiError::status(status, "injected failure")),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeFunctions {
    namespaces: Mutex<BTreeMap<String, Namespace>>,
    next_id: Mutex<Option<String>>,
    counter: AtomicUsize,
    patches: AtomicUsize,
    failure: Failure,
}

impl FakeFunctions {
    /// Id given to the next created namespace
    pub fn with_next_id(self, id: &str) -> Self {
        *self.next_id.lock().unwrap() = Some(id.to_owned());
        self
    }

    pub fn fail_requests(&self, status: u16) {
        self.failure.set(status);
    }

    pub fn remove(&self, id: &str) {
        self.namespaces.lock().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.namespaces.lock().unwrap().len()
    }

    pub fn patches(&self) -> usize {
        self.patches.load(Ordering::SeqCst)
    }

    pub fn insert_named(&self, name: &str, resource_group_id: &str) -> Namespace {
        let namespace = Namespace {
            id: self.allocate_id(),
            name: Some(name.to_owned()),
            resource_group_id: Some(resource_group_id.to_owned()),
            resource_plan_id: Some("functions-base-plan".to_owned()),
            location: Some("us-south".to_owned()),
            ..Default::default()
        };
        self.namespaces
            .lock()
            .unwrap()
            .insert(namespace.id.clone(), namespace.clone());
        namespace
    }

    fn allocate_id(&self) -> String {
        self.next_id
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| format!("ns-{}", self.counter.fetch_add(1, Ordering::SeqCst)))
    }
}

#[async_trait]
impl FunctionsApi for FakeFunctions {
    async fn create_namespace(&self, request: &CreateNamespace) -> Result<Namespace, ApiError> {
        self.failure.check()?;
        let id = self.allocate_id();
        let namespace = Namespace {
            crn: Some(format!(
                "crn:v1:bluemix:public:functions:us-south:a/fake::namespace:{id}"
            )),
            id,
            name: Some(request.name.clone()),
            description: request.description.clone(),
            resource_group_id: Some(request.resource_group_id.clone()),
            resource_plan_id: Some(request.resource_plan_id.clone()),
            location: Some("us-south".to_owned()),
        };
        self.namespaces
            .lock()
            .unwrap()
            .insert(namespace.id.clone(), namespace.clone());
        Ok(namespace)
    }

    async fn get_namespace(&self, id: &str) -> Result<Namespace, ApiError> {
        self.failure.check()?;
        self.namespaces
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("namespace", id))
    }

    async fn update_namespace(&self, id: &str, patch: &NamespacePatch) -> Result<Namespace, ApiError> {
        self.failure.check()?;
        self.patches.fetch_add(1, Ordering::SeqCst);
        let mut namespaces = self.namespaces.lock().unwrap();
        let namespace = namespaces.get_mut(id).ok_or_else(|| not_found("namespace", id))?;
        if let Some(name) = &patch.name {
            namespace.name = Some(name.clone());
        }
        if let Some(description) = &patch.description {
            namespace.description = Some(description.clone());
        }
        Ok(namespace.clone())
    }

    async fn delete_namespace(&self, id: &str) -> Result<(), ApiError> {
        self.failure.check()?;
        self.namespaces
            .lock()
            .unwrap()
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("namespace", id))
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ApiError> {
        self.failure.check()?;
        Ok(self.namespaces.lock().unwrap().values().cloned().collect())
    }
}

/// Block storage that takes `settle_polls` reads to finish any transition
#[derive(Debug, Default)]
pub struct FakeVpc {
    volumes: Mutex<BTreeMap<String, Volume>>,
    transitions: Mutex<HashMap<String, usize>>,
    settle_polls: usize,
    provisioning_fails: bool,
    counter: AtomicUsize,
    gets: AtomicUsize,
    failure: Failure,
    get_failure: Failure,
}

impl FakeVpc {
    pub fn with_settle_polls(mut self, polls: usize) -> Self {
        self.settle_polls = polls;
        self
    }

    pub fn with_failed_provisioning(mut self) -> Self {
        self.provisioning_fails = true;
        self
    }

    pub fn fail_requests(&self, status: u16) {
        self.failure.set(status);
    }

    /// Make reads fail while writes keep working
    pub fn fail_gets(&self, status: u16) {
        self.get_failure.set(status);
    }

    pub fn remove(&self, id: &str) {
        self.volumes.lock().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.volumes.lock().unwrap().len()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn insert(&self, volume: Volume) {
        self.volumes
            .lock()
            .unwrap()
            .insert(volume.id.clone(), volume);
    }

    fn start_transition(&self, id: &str) {
        self.transitions
            .lock()
            .unwrap()
            .insert(id.to_owned(), self.settle_polls);
    }
}

#[async_trait]
impl VpcApi for FakeVpc {
    async fn create_volume(&self, prototype: &VolumePrototype) -> Result<Volume, ApiError> {
        self.failure.check()?;
        let id = format!("r006-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        let capacity = prototype.capacity.unwrap_or(100);
        let volume = Volume {
            crn: Some(format!("crn:v1:bluemix:public:is:us-south-1:a/fake::volume:{id}")),
            id: id.clone(),
            name: Some(prototype.name.clone()),
            capacity: Some(capacity),
            iops: Some(prototype.iops.unwrap_or(3000)),
            bandwidth: Some(capacity * 8),
            status: Some("pending".to_owned()),
            status_reasons: Vec::new(),
            health_state: Some("inapplicable".to_owned()),
            encryption: Some(if prototype.encryption_key.is_some() {
                "user_managed".to_owned()
            } else {
                "provider_managed".to_owned()
            }),
            encryption_key: prototype.encryption_key.clone(),
            profile: Some(prototype.profile.clone()),
            zone: Some(prototype.zone.clone()),
            resource_group: Some(
                prototype
                    .resource_group
                    .clone()
                    .unwrap_or_else(|| IdReference {
                        id: "default-rg".to_owned(),
                    }),
            ),
            source_snapshot: prototype.source_snapshot.clone(),
            user_tags: prototype.user_tags.clone(),
            created_at: Some("2024-05-02T10:00:00Z".to_owned()),
        };
        self.insert(volume.clone());
        self.start_transition(&id);
        Ok(volume)
    }

    async fn get_volume(&self, id: &str) -> Result<Volume, ApiError> {
        self.failure.check()?;
        self.get_failure.check()?;
        self.gets.fetch_add(1, Ordering::SeqCst);

        let mut transitions = self.transitions.lock().unwrap();
        let mut volumes = self.volumes.lock().unwrap();
        let volume = volumes.get_mut(id).ok_or_else(|| not_found("volume", id))?;

        if let Some(remaining) = transitions.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(volume.clone());
            }
            transitions.remove(id);
            if volume.status.as_deref() == Some("deleting") {
                volumes.remove(id);
                return Err(not_found("volume", id));
            }
            if self.provisioning_fails {
                volume.status = Some("failed".to_owned());
                volume.status_reasons = vec![StatusReason {
                    code: "encryption_key_deleted".to_owned(),
                    message: "The encryption key has been deleted".to_owned(),
                    more_info: None,
                }];
            } else {
                volume.status = Some("available".to_owned());
            }
        }
        Ok(volume.clone())
    }

    async fn update_volume(&self, id: &str, patch: &VolumePatch) -> Result<Volume, ApiError> {
        self.failure.check()?;
        let mut volumes = self.volumes.lock().unwrap();
        let volume = volumes.get_mut(id).ok_or_else(|| not_found("volume", id))?;
        if let Some(name) = &patch.name {
            volume.name = Some(name.clone());
        }
        if let Some(tags) = &patch.user_tags {
            volume.user_tags = tags.clone();
        }
        let resized = patch.capacity.is_some() || patch.iops.is_some() || patch.profile.is_some();
        if let Some(capacity) = patch.capacity {
            volume.capacity = Some(capacity);
            volume.bandwidth = Some(capacity * 8);
        }
        if let Some(iops) = patch.iops {
            volume.iops = Some(iops);
        }
        if let Some(profile) = &patch.profile {
            volume.profile = Some(profile.clone());
        }
        if resized {
            volume.status = Some("updating".to_owned());
            let volume = volume.clone();
            drop(volumes);
            self.start_transition(id);
            return Ok(volume);
        }
        Ok(volume.clone())
    }

    async fn delete_volume(&self, id: &str) -> Result<(), ApiError> {
        self.failure.check()?;
        let mut volumes = self.volumes.lock().unwrap();
        let volume = volumes.get_mut(id).ok_or_else(|| not_found("volume", id))?;
        volume.status = Some("deleting".to_owned());
        drop(volumes);
        self.start_transition(id);
        Ok(())
    }

    async fn list_volumes(&self, name: Option<&str>) -> Result<Vec<Volume>, ApiError> {
        self.failure.check()?;
        Ok(self
            .volumes
            .lock()
            .unwrap()
            .values()
            .filter(|volume| name.is_none() || volume.name.as_deref() == name)
            .cloned()
            .collect())
    }
}

impl FakeVpc {
    /// Volume as stored, without going through a transition
    pub fn volume(&self, id: &str) -> Option<Volume> {
        self.volumes.lock().unwrap().get(id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct FakeSatellite {
    endpoints: Mutex<BTreeMap<(String, String), Endpoint>>,
    counter: AtomicUsize,
    failure: Failure,
}

impl FakeSatellite {
    pub fn fail_requests(&self, status: u16) {
        self.failure.set(status);
    }

    pub fn remove(&self, location: &str, endpoint: &str) {
        self.endpoints
            .lock()
            .unwrap()
            .remove(&(location.to_owned(), endpoint.to_owned()));
    }

    pub fn len(&self) -> usize {
        self.endpoints.lock().unwrap().len()
    }
}

#[async_trait]
impl SatelliteApi for FakeSatellite {
    async fn create_endpoint(
        &self,
        location: &str,
        prototype: &EndpointPrototype,
    ) -> Result<Endpoint, ApiError> {
        self.failure.check()?;
        let id = format!("ep-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        let endpoint = Endpoint {
            location_id: Some(location.to_owned()),
            endpoint_id: id.clone(),
            conn_type: Some(prototype.conn_type.clone()),
            display_name: Some(prototype.display_name.clone()),
            server_host: Some(prototype.server_host.clone()),
            server_port: Some(prototype.server_port),
            sni: prototype.sni.clone(),
            client_protocol: Some(prototype.client_protocol.clone()),
            client_mutual_auth: Some(prototype.client_mutual_auth.unwrap_or(false)),
            server_protocol: Some(
                prototype
                    .server_protocol
                    .clone()
                    .unwrap_or_else(|| prototype.client_protocol.clone()),
            ),
            server_mutual_auth: Some(prototype.server_mutual_auth.unwrap_or(false)),
            reject_unauth: Some(prototype.reject_unauth.unwrap_or(false)),
            timeout: Some(prototype.timeout.unwrap_or(60)),
            created_by: Some(
                prototype
                    .created_by
                    .clone()
                    .unwrap_or_else(|| "terraform".to_owned()),
            ),
            crn: Some(format!(
                "crn:v1:bluemix:public:satellite:us-east:a/fake::endpoint:{location}/{id}"
            )),
            service_name: Some(format!("{}-service", prototype.display_name)),
            client_host: Some(format!("c-01.{location}.link.satellite.cloud.ibm.com")),
            client_port: Some(30000),
            connector_port: Some(33000),
            status: Some("enabled".to_owned()),
            created_at: Some("1714644000".to_owned()),
            last_change: Some("1714644000".to_owned()),
        };
        self.endpoints
            .lock()
            .unwrap()
            .insert((location.to_owned(), id), endpoint.clone());
        Ok(endpoint)
    }

    async fn get_endpoint(&self, location: &str, endpoint: &str) -> Result<Endpoint, ApiError> {
        self.failure.check()?;
        self.endpoints
            .lock()
            .unwrap()
            .get(&(location.to_owned(), endpoint.to_owned()))
            .cloned()
            .ok_or_else(|| not_found("endpoint", endpoint))
    }

    async fn update_endpoint(
        &self,
        location: &str,
        endpoint: &str,
        patch: &EndpointPatch,
    ) -> Result<Endpoint, ApiError> {
        self.failure.check()?;
        let mut endpoints = self.endpoints.lock().unwrap();
        let current = endpoints
            .get_mut(&(location.to_owned(), endpoint.to_owned()))
            .ok_or_else(|| not_found("endpoint", endpoint))?;
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if let Some(value) = &patch.$field {
                    current.$field = Some(value.clone());
                })*
            };
        }
        apply!(
            display_name,
            server_host,
            server_port,
            sni,
            client_protocol,
            client_mutual_auth,
            server_protocol,
            server_mutual_auth,
            reject_unauth,
            timeout
        );
        current.last_change = Some("1714647600".to_owned());
        Ok(current.clone())
    }

    async fn delete_endpoint(&self, location: &str, endpoint: &str) -> Result<(), ApiError> {
        self.failure.check()?;
        self.endpoints
            .lock()
            .unwrap()
            .remove(&(location.to_owned(), endpoint.to_owned()))
            .map(drop)
            .ok_or_else(|| not_found("endpoint", endpoint))
    }
}
