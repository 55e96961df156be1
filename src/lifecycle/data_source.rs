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

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tf_provider::value::ValueEmpty;
use tf_provider::{AttributePath, DataSource, Diagnostics, Schema};

use crate::conns::{ApiError, ClientSession, SessionError, SessionHandle};
use crate::utils::{WithSchema, WithValidate};

use super::{session_client, Operation};

/// Find a remote object by a key given in the configuration
#[async_trait]
pub trait Lookup: Debug + Send + Sync + 'static {
    const KIND: &'static str;
    /// Attribute holding the lookup key
    const KEY: &'static str;

    type Client: ?Sized + Send + Sync;
    type Remote: Send;
    type State<'a>: Debug
        + Default
        + Clone
        + PartialEq
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + WithSchema
        + WithValidate;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError>;

    fn key(state: &Self::State<'_>, diags: &mut Diagnostics) -> Option<String>;

    async fn find(&self, client: &Self::Client, key: &str) -> Result<Option<Self::Remote>, ApiError>;

    fn flatten(state: &mut Self::State<'_>, remote: Self::Remote);
}

#[derive(Debug)]
pub struct LookupDataSource<L: Lookup> {
    lookup: L,
    session: SessionHandle,
}

impl<L: Lookup> LookupDataSource<L> {
    pub fn new(lookup: L, session: SessionHandle) -> Self {
        Self { lookup, session }
    }
}

#[async_trait]
impl<L: Lookup> DataSource for LookupDataSource<L> {
    type State<'a> = L::State<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<L::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags);

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let key = L::key(&config, diags)?;
        let client = session_client(&self.session, diags, L::KIND, L::client).await?;

        match self.lookup.find(&client, &key).await {
            Ok(Some(remote)) => {
                let mut state = config;
                L::flatten(&mut state, remote);
                Some(state)
            }
            Ok(None) => {
                diags.error(
                    format!("No {} found", L::KIND),
                    format!("There is no {} with {} `{key}`", L::KIND, L::KEY),
                    AttributePath::new(L::KEY),
                );
                None
            }
            Err(err) => {
                Operation::Reading.report(diags, L::KIND, err);
                None
            }
        }
    }
}
