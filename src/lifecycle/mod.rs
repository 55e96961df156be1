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

//! Generic adapters between Terraform callbacks and IBM Cloud services.
//!
//! A resource kind implements [`Lifecycle`] on typed specs and service
//! structs, [`LifecycleResource`] turns it into a Terraform resource.
//! Data sources do the same through [`Lookup`] and [`LookupDataSource`].

use std::fmt::{Debug, Display};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error as ThisError;
use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};
use tracing::error;

use crate::conns::{ApiError, ClientSession, SessionConfig, SessionError, SessionHandle};
use crate::identifier::{IdError, ResourceId};
use crate::timeouts::{StateTimeouts, Timeouts};
use crate::utils::{WithSchema, WithValidate};
use crate::wait::WaitError;

mod data_source;
mod resource;

pub use data_source::{Lookup, LookupDataSource};
pub use resource::LifecycleResource;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Id(#[from] IdError),
}

/// Typed Terraform state of a resource kind
pub trait StateModel<'a>:
    Debug
    + Default
    + Clone
    + PartialEq
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + WithSchema
    + WithValidate
{
    fn id(&self) -> &ValueString<'a>;
    fn set_id(&mut self, id: ValueString<'a>);
    fn timeouts(&self) -> &Value<StateTimeouts<'a>>;

    /// Plan the computed attributes, `prior` being the current state on update
    fn plan_computed(&mut self, prior: Option<&Self>);

    /// Attributes whose change from `self` to `planned` requires a new object
    fn replace_triggers(&self, planned: &Self) -> Vec<AttributePath>;
}

/// Create, read, update and delete operations of a resource kind
#[async_trait]
pub trait Lifecycle: Debug + Send + Sync + 'static {
    /// Human name used in diagnostics (`Error creating <KIND>`)
    const KIND: &'static str;
    const DEFAULT_TIMEOUTS: Timeouts;

    type Client: ?Sized + Send + Sync;
    type Id: ResourceId;
    type Spec: Debug + Send + Sync;
    type Remote: Send;
    type State<'a>: StateModel<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError>;

    /// Build the spec sent to the service, reporting missing attributes.
    ///
    /// `provider` holds the defaults set on the provider block.
    fn expand(
        state: &Self::State<'_>,
        provider: &SessionConfig,
        diags: &mut Diagnostics,
    ) -> Option<Self::Spec>;

    /// Copy every field of the remote object into the state
    fn flatten(state: &mut Self::State<'_>, remote: Self::Remote);

    async fn create(
        &self,
        client: &Self::Client,
        spec: &Self::Spec,
        timeouts: &Timeouts,
    ) -> Result<Self::Id, Error>;

    /// Wait for a freshly created object to be usable.
    ///
    /// The object id is already recorded in the state when this is called.
    async fn wait_created(
        &self,
        _client: &Self::Client,
        _id: &Self::Id,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Fetch the remote object, `None` when it does not exist anymore
    async fn read(
        &self,
        client: &Self::Client,
        id: &Self::Id,
    ) -> Result<Option<Self::Remote>, Error>;

    async fn update(
        &self,
        _client: &Self::Client,
        _id: &Self::Id,
        _prior: &Self::Spec,
        _planned: &Self::Spec,
        _timeouts: &Timeouts,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn delete(
        &self,
        client: &Self::Client,
        id: &Self::Id,
        timeouts: &Timeouts,
    ) -> Result<(), Error>;

    async fn exists(&self, client: &Self::Client, id: &Self::Id) -> Result<bool, Error> {
        Ok(self.read(client, id).await?.is_some())
    }
}

/// Map a not found error to `None`
pub fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Record a changed attribute into replace triggers
pub fn trigger_if_changed<T: PartialEq>(
    triggers: &mut Vec<AttributePath>,
    attr: &str,
    prior: &Value<T>,
    planned: &Value<T>,
) {
    if prior != planned {
        triggers.push(AttributePath::new(attr));
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation {
    Creating,
    Reading,
    Updating,
    Deleting,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Creating => "creating",
            Operation::Reading => "reading",
            Operation::Updating => "updating",
            Operation::Deleting => "deleting",
        })
    }
}

impl Operation {
    pub(crate) fn report(self, diags: &mut Diagnostics, kind: &str, err: impl Display) {
        error!(kind, operation = %self, %err, "operation failed");
        diags.root_error(format!("Error {self} {kind}"), err.to_string());
    }
}

/// Get a service client out of the shared session
pub(crate) async fn session_client<C: ?Sized>(
    session: &SessionHandle,
    diags: &mut Diagnostics,
    kind: &str,
    get: impl FnOnce(&ClientSession) -> Result<Arc<C>, SessionError>,
) -> Option<Arc<C>> {
    Some(session_parts(session, diags, kind, get).await?.0)
}

/// Get a service client and the provider settings out of the shared session
pub(crate) async fn session_parts<C: ?Sized>(
    session: &SessionHandle,
    diags: &mut Diagnostics,
    kind: &str,
    get: impl FnOnce(&ClientSession) -> Result<Arc<C>, SessionError>,
) -> Option<(Arc<C>, SessionConfig)> {
    let session = session.read().await;
    let parts = match session.as_deref() {
        Some(session) => get(session).map(|client| (client, session.config().clone())),
        None => Err(SessionError::NotConfigured),
    };
    match parts {
        Ok(parts) => Some(parts),
        Err(err) => {
            diags.root_error(format!("Could not reach the {kind} service"), err.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conns::fake;

    use super::*;

    #[test]
    fn not_found_is_absent() {
        assert_eq!(not_found_as_none(Ok::<_, ApiError>(1)).unwrap(), Some(1));
        assert_eq!(
            not_found_as_none::<()>(Err(ApiError::status(404, "gone"))).unwrap(),
            None
        );
        assert!(not_found_as_none::<()>(Err(ApiError::status(403, "denied"))).is_err());
    }

    #[test]
    fn operation_messages() {
        let mut diags = Diagnostics::default();
        Operation::Creating.report(&mut diags, "volume", ApiError::status(500, "oops"));
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(Operation::Deleting.to_string(), "deleting");
    }

    #[tokio::test]
    async fn unconfigured_session() {
        let session = SessionHandle::default();
        let mut diags = Diagnostics::default();
        let client = session_client(&session, &mut diags, "VPC", ClientSession::vpc).await;
        assert!(client.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn session_parts_carry_provider_settings() {
        let config = SessionConfig {
            zone: Some("eu-de-2".to_owned()),
            ..fake::config()
        };
        let session =
            fake::session_from(config, Default::default(), Default::default(), Default::default());
        let mut diags = Diagnostics::default();
        let (_, config) = session_parts(&session, &mut diags, "VPC", ClientSession::vpc)
            .await
            .unwrap();
        assert_eq!(config.zone.as_deref(), Some("eu-de-2"));

        let anonymous = SessionConfig {
            api_key: None,
            ..fake::config()
        };
        let session =
            fake::session_from(anonymous, Default::default(), Default::default(), Default::default());
        assert!(session_parts(&session, &mut diags, "VPC", ClientSession::vpc)
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
