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

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};
use tracing::{info, warn};

use crate::conns::{SessionConfig, SessionHandle};
use crate::identifier::ResourceId;
use crate::timeouts::{self, Timeouts};
use crate::utils::{WithSchema, WithValidate};

use super::{session_client, session_parts, Lifecycle, Operation, StateModel};

/// Terraform resource driven by a [`Lifecycle`]
#[derive(Debug)]
pub struct LifecycleResource<L: Lifecycle> {
    lifecycle: L,
    session: SessionHandle,
}

impl<L: Lifecycle> LifecycleResource<L> {
    pub fn new(lifecycle: L, session: SessionHandle) -> Self {
        Self { lifecycle, session }
    }

    async fn get_client(&self, diags: &mut Diagnostics) -> Option<Arc<L::Client>> {
        session_client(&self.session, diags, L::KIND, L::client).await
    }

    async fn get_client_and_config(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<(Arc<L::Client>, SessionConfig)> {
        session_parts(&self.session, diags, L::KIND, L::client).await
    }

    fn decode_id(diags: &mut Diagnostics, state: &L::State<'_>) -> Option<L::Id> {
        let Some(id) = state.id().as_deref_option() else {
            diags.error(
                "Missing resource id",
                format!("The {} has no id in its state", L::KIND),
                AttributePath::new("id"),
            );
            return None;
        };
        match L::Id::decode(id) {
            Ok(id) => Some(id),
            Err(err) => {
                diags.error("Invalid resource id", err.to_string(), AttributePath::new("id"));
                None
            }
        }
    }

    fn timeouts(diags: &mut Diagnostics, state: &L::State<'_>) -> Option<Timeouts> {
        timeouts::resolve(diags, state.timeouts(), L::DEFAULT_TIMEOUTS)
    }

    /// Read the remote object into `state`.
    ///
    /// An object that does not exist anymore gives a null state, dropping the
    /// resource from Terraform.
    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        client: &L::Client,
        id: &L::Id,
        mut state: L::State<'a>,
    ) -> Option<Value<L::State<'a>>> {
        match self.lifecycle.read(client, id).await {
            Ok(Some(remote)) => {
                L::flatten(&mut state, remote);
                Some(Value::Value(state))
            }
            Ok(None) => {
                warn!(
                    kind = L::KIND,
                    id = %id.encode(),
                    "remote object not found, removing it from state"
                );
                Some(Value::Null)
            }
            Err(err) => {
                Operation::Reading.report(diags, L::KIND, err);
                None
            }
        }
    }
}

#[async_trait]
impl<L: Lifecycle> Resource for LifecycleResource<L> {
    type State<'a> = Value<L::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<L::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags);
            Self::timeouts(diags, config);
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(state) = state else {
            return Some((state, private_state));
        };
        let id = Self::decode_id(diags, &state)?;
        let client = self.get_client(diags).await?;
        let state = self.refresh(diags, &client, &id, state).await?;
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = proposed_state else {
            return Some((proposed_state, Default::default()));
        };
        state.set_id(Value::Unknown);
        state.plan_computed(None);
        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<AttributePath>,
    )> {
        let (Value::Value(prior), Value::Value(mut state)) = (&prior_state, proposed_state.clone())
        else {
            return Some((proposed_state, prior_private_state, Vec::new()));
        };
        state.set_id(prior.id().clone());
        state.plan_computed(Some(prior));
        let trigger_replace = prior.replace_triggers(&state);
        Some((Value::Value(state), prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = planned_state else {
            diags.root_error(
                format!("Error creating {}", L::KIND),
                "The planned state is null",
            );
            return None;
        };
        let (client, provider) = self.get_client_and_config(diags).await?;
        let spec = L::expand(&state, &provider, diags)?;
        let timeouts = Self::timeouts(diags, &state)?;

        let id = match self.lifecycle.create(&client, &spec, &timeouts).await {
            Ok(id) => id,
            Err(err) => {
                Operation::Creating.report(diags, L::KIND, err);
                return None;
            }
        };
        info!(kind = L::KIND, id = %id.encode(), "created");
        state.set_id(Value::Value(Cow::Owned(id.encode())));

        // The object exists from now on: it is kept in the state even when
        // waiting fails, so Terraform marks it as tainted.
        if let Err(err) = self.lifecycle.wait_created(&client, &id, &timeouts).await {
            Operation::Creating.report(diags, L::KIND, err);
        }

        // A failed refresh still hands the id back to Terraform.
        let created = state.clone();
        match self.refresh(diags, &client, &id, state).await {
            Some(Value::Value(state)) => Some((Value::Value(state), private_state)),
            Some(_) => {
                diags.root_error(
                    format!("Error creating {}", L::KIND),
                    format!("{} `{}` disappeared right after its creation", L::KIND, id.encode()),
                );
                None
            }
            None => Some((Value::Value(created), private_state)),
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (Value::Value(prior), Value::Value(state)) = (prior_state, planned_state) else {
            diags.root_error(
                format!("Error updating {}", L::KIND),
                "The prior or planned state is null",
            );
            return None;
        };
        let id = Self::decode_id(diags, &prior)?;
        let (client, provider) = self.get_client_and_config(diags).await?;
        let prior_spec = L::expand(&prior, &provider, diags)?;
        let planned_spec = L::expand(&state, &provider, diags)?;
        let timeouts = Self::timeouts(diags, &state)?;

        if let Err(err) = self
            .lifecycle
            .update(&client, &id, &prior_spec, &planned_spec, &timeouts)
            .await
        {
            Operation::Updating.report(diags, L::KIND, err);
            return None;
        }
        info!(kind = L::KIND, id = %id.encode(), "updated");

        let state = self.refresh(diags, &client, &id, state).await?;
        Some((state, private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = state else {
            return Some(());
        };
        let id = Self::decode_id(diags, &state)?;
        let timeouts = Self::timeouts(diags, &state)?;
        let client = self.get_client(diags).await?;

        match self.lifecycle.exists(&client, &id).await {
            Ok(true) => (),
            Ok(false) => {
                warn!(kind = L::KIND, id = %id.encode(), "already deleted");
                return Some(());
            }
            Err(err) => {
                Operation::Deleting.report(diags, L::KIND, err);
                return None;
            }
        }

        match self.lifecycle.delete(&client, &id, &timeouts).await {
            Ok(()) => {
                info!(kind = L::KIND, id = %id.encode(), "deleted");
                Some(())
            }
            Err(err) => {
                Operation::Deleting.report(diags, L::KIND, err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        if let Err(err) = L::Id::decode(&id) {
            diags.root_error(format!("Cannot import {}", L::KIND), err.to_string());
            return None;
        }

        let mut state: L::State<'a> = Default::default();
        state.set_id(Value::Value(Cow::Owned(id)));
        Some((Value::Value(state), Default::default()))
    }
}
