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
use tracing::debug;

use crate::conns::{ApiError, ClientSession, SessionConfig, SessionError};
use crate::flex;
use crate::identifier::OpaqueId;
use crate::lifecycle::{not_found_as_none, Error, Lifecycle, Lookup};
use crate::timeouts::Timeouts;
use crate::wait::{StateChangeConf, WaitError, DONE};

use super::client::{
    CrnReference, IdReference, NameReference, Volume, VolumePatch, VolumePrototype, VpcApi,
};
use super::state::{VolumeDataState, VolumeState};

const RETRY: &str = "retry";
const PROVISIONING: &str = "provisioning";
const DELETING: &str = "deleting";
const FAILED: &str = "failed";

/// Capacity of a volume that is not restored from a snapshot
const DEFAULT_CAPACITY: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub name: String,
    pub profile: String,
    pub zone: String,
    pub capacity: Option<i64>,
    pub iops: Option<i64>,
    pub encryption_key: Option<String>,
    pub resource_group: Option<String>,
    pub source_snapshot: Option<String>,
    pub tags: Vec<String>,
}

impl VolumeSpec {
    fn prototype(&self) -> VolumePrototype {
        VolumePrototype {
            name: self.name.clone(),
            profile: NameReference {
                name: self.profile.clone(),
            },
            zone: NameReference {
                name: self.zone.clone(),
            },
            capacity: self.capacity,
            iops: self.iops,
            encryption_key: self
                .encryption_key
                .clone()
                .map(|crn| CrnReference { crn }),
            resource_group: self.resource_group.clone().map(|id| IdReference { id }),
            source_snapshot: self.source_snapshot.clone().map(|id| IdReference { id }),
            user_tags: self.tags.clone(),
        }
    }

    /// Patch turning `self` into `planned`
    fn patch(&self, planned: &Self) -> VolumePatch {
        let changed = |prior: Option<i64>, planned: Option<i64>| planned.filter(|_| planned != prior);
        let mut patch = VolumePatch {
            capacity: changed(self.capacity, planned.capacity),
            iops: changed(self.iops, planned.iops),
            ..Default::default()
        };
        if self.name != planned.name {
            patch.name = Some(planned.name.clone());
        }
        if self.profile != planned.profile {
            patch.profile = Some(NameReference {
                name: planned.profile.clone(),
            });
        }
        let mut prior_tags = self.tags.clone();
        let mut planned_tags = planned.tags.clone();
        prior_tags.sort();
        planned_tags.sort();
        if prior_tags != planned_tags {
            patch.user_tags = Some(planned.tags.clone());
        }
        patch
    }
}

async fn wait_available(
    client: &dyn VpcApi,
    id: &str,
    timeout: Duration,
) -> Result<Option<Volume>, WaitError> {
    debug!(id, "waiting for volume to be available");
    StateChangeConf::new(
        &[RETRY, PROVISIONING],
        &[DONE],
        || async move {
            let volume = client.get_volume(id).await?;
            let state = match volume.status.as_deref() {
                Some("available") => DONE,
                Some(FAILED) => FAILED,
                _ => PROVISIONING,
            };
            Ok::<_, ApiError>((Some(volume), state.to_owned()))
        },
        timeout,
    )
    .wait_for_state()
    .await
}

async fn wait_deleted(client: &dyn VpcApi, id: &str, timeout: Duration) -> Result<(), WaitError> {
    debug!(id, "waiting for volume to be deleted");
    StateChangeConf::new(
        &[RETRY, DELETING],
        &[DONE],
        || async move {
            match client.get_volume(id).await {
                Ok(volume) => Ok((Some(volume), DELETING.to_owned())),
                Err(err) if err.is_not_found() => Ok((None, DONE.to_owned())),
                Err(err) => Err(err),
            }
        },
        timeout,
    )
    .wait_for_state()
    .await
    .map(drop)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeLifecycle;

#[async_trait]
impl Lifecycle for VolumeLifecycle {
    const KIND: &'static str = "volume";
    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::uniform(Duration::from_secs(600));

    type Client = dyn VpcApi;
    type Id = OpaqueId;
    type Spec = VolumeSpec;
    type Remote = Volume;
    type State<'a> = VolumeState<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError> {
        session.vpc()
    }

    fn expand(
        state: &VolumeState<'_>,
        provider: &SessionConfig,
        diags: &mut Diagnostics,
    ) -> Option<VolumeSpec> {
        let name = flex::required_string(&state.name, diags, "name");
        let profile = flex::required_string(&state.profile, diags, "profile");
        let zone = flex::expand_string(&state.zone).or_else(|| provider.zone.clone());
        if zone.is_none() {
            diags.error(
                "Missing `zone`",
                "`zone` must be set on the volume or on the provider",
                AttributePath::new("zone"),
            );
        }
        let source_snapshot = flex::expand_string(&state.source_snapshot);
        let capacity = flex::expand_number(&state.capacity)
            .or_else(|| source_snapshot.is_none().then_some(DEFAULT_CAPACITY));

        Some(VolumeSpec {
            name: name?,
            profile: profile?,
            zone: zone?,
            capacity,
            iops: flex::expand_number(&state.iops),
            encryption_key: flex::expand_string(&state.encryption_key),
            resource_group: flex::expand_string(&state.resource_group)
                .or_else(|| provider.resource_group.clone()),
            source_snapshot,
            tags: flex::expand_string_set(&state.tags),
        })
    }

    fn flatten(state: &mut VolumeState<'_>, remote: Volume) {
        state.flatten(remote);
    }

    async fn create(
        &self,
        client: &dyn VpcApi,
        spec: &VolumeSpec,
        _timeouts: &Timeouts,
    ) -> Result<OpaqueId, Error> {
        let volume = client.create_volume(&spec.prototype()).await?;
        Ok(OpaqueId(volume.id))
    }

    async fn wait_created(
        &self,
        client: &dyn VpcApi,
        id: &OpaqueId,
        timeouts: &Timeouts,
    ) -> Result<(), Error> {
        wait_available(client, id.as_str(), timeouts.create).await?;
        Ok(())
    }

    async fn read(&self, client: &dyn VpcApi, id: &OpaqueId) -> Result<Option<Volume>, Error> {
        Ok(not_found_as_none(client.get_volume(id.as_str()).await)?)
    }

    async fn update(
        &self,
        client: &dyn VpcApi,
        id: &OpaqueId,
        prior: &VolumeSpec,
        planned: &VolumeSpec,
        timeouts: &Timeouts,
    ) -> Result<(), Error> {
        let patch = prior.patch(planned);
        if patch.is_empty() {
            return Ok(());
        }
        client.update_volume(id.as_str(), &patch).await?;
        if patch.resizes() {
            wait_available(client, id.as_str(), timeouts.update).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn VpcApi,
        id: &OpaqueId,
        timeouts: &Timeouts,
    ) -> Result<(), Error> {
        if not_found_as_none(client.delete_volume(id.as_str()).await)?.is_none() {
            return Ok(());
        }
        wait_deleted(client, id.as_str(), timeouts.delete).await?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeLookup;

#[async_trait]
impl Lookup for VolumeLookup {
    const KIND: &'static str = "volume";
    const KEY: &'static str = "name";

    type Client = dyn VpcApi;
    type Remote = Volume;
    type State<'a> = VolumeDataState<'a>;

    fn client(session: &ClientSession) -> Result<Arc<Self::Client>, SessionError> {
        session.vpc()
    }

    fn key(state: &VolumeDataState<'_>, diags: &mut Diagnostics) -> Option<String> {
        flex::required_string(&state.name, diags, Self::KEY)
    }

    async fn find(&self, client: &dyn VpcApi, name: &str) -> Result<Option<Volume>, ApiError> {
        Ok(client
            .list_volumes(Some(name))
            .await?
            .into_iter()
            .find(|volume| volume.name.as_deref() == Some(name)))
    }

    fn flatten(state: &mut VolumeDataState<'_>, remote: Volume) {
        state.flatten(remote);
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeSet;

    use tf_provider::value::Value;
    use tf_provider::{DataSource, Resource};

    use crate::conns::fake::{self, FakeVpc};
    use crate::lifecycle::{LifecycleResource, LookupDataSource};

    use super::*;

    fn spec() -> VolumeSpec {
        VolumeSpec {
            name: "data".to_owned(),
            profile: "general-purpose".to_owned(),
            zone: "us-south-1".to_owned(),
            capacity: Some(100),
            iops: None,
            encryption_key: None,
            resource_group: None,
            source_snapshot: None,
            tags: vec!["env:dev".to_owned()],
        }
    }

    fn config<'a>() -> VolumeState<'a> {
        VolumeState {
            name: Value::Value(Cow::Borrowed("data")),
            profile: Value::Value(Cow::Borrowed("general-purpose")),
            zone: Value::Value(Cow::Borrowed("us-south-1")),
            ..Default::default()
        }
    }

    #[test]
    fn capacity_defaults_without_snapshot() {
        let mut diags = Diagnostics::default();
        let spec = VolumeLifecycle::expand(&config(), &fake::config(), &mut diags).unwrap();
        assert_eq!(spec.capacity, Some(DEFAULT_CAPACITY));

        let restored = VolumeState {
            source_snapshot: Value::Value(Cow::Borrowed("r006-snap")),
            ..config()
        };
        let spec = VolumeLifecycle::expand(&restored, &fake::config(), &mut diags).unwrap();
        assert_eq!(spec.capacity, None);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn zone_falls_back_to_the_provider() {
        let mut diags = Diagnostics::default();
        let unzoned = VolumeState {
            zone: Value::Unknown,
            ..config()
        };
        assert!(VolumeLifecycle::expand(&unzoned, &fake::config(), &mut diags).is_none());
        assert_eq!(diags.errors.len(), 1);

        let provider = SessionConfig {
            zone: Some("us-south-3".to_owned()),
            resource_group: Some("rg-9".to_owned()),
            ..fake::config()
        };
        let spec = VolumeLifecycle::expand(&unzoned, &provider, &mut diags).unwrap();
        assert_eq!(spec.zone, "us-south-3");
        assert_eq!(spec.resource_group.as_deref(), Some("rg-9"));

        // Attributes set on the volume win
        let spec = VolumeLifecycle::expand(&config(), &provider, &mut diags).unwrap();
        assert_eq!(spec.zone, "us-south-1");
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn patch_holds_changed_fields() {
        let prior = spec();
        assert!(prior.patch(&prior).is_empty());

        let planned = VolumeSpec {
            capacity: Some(250),
            tags: vec![],
            ..spec()
        };
        let patch = prior.patch(&planned);
        assert_eq!(patch.capacity, Some(250));
        assert_eq!(patch.user_tags, Some(vec![]));
        assert_eq!(patch.name, None);
        assert!(patch.resizes());
    }

    #[tokio::test(start_paused = true)]
    async fn create_waits_for_available() {
        let vpc = FakeVpc::default().with_settle_polls(3);
        let timeouts = VolumeLifecycle::DEFAULT_TIMEOUTS;

        let id = VolumeLifecycle.create(&vpc, &spec(), &timeouts).await.unwrap();
        VolumeLifecycle
            .wait_created(&vpc, &id, &timeouts)
            .await
            .unwrap();
        assert_eq!(vpc.gets(), 4);

        let volume = VolumeLifecycle.read(&vpc, &id).await.unwrap().unwrap();
        assert_eq!(volume.status.as_deref(), Some("available"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_provisioning_aborts() {
        let vpc = FakeVpc::default().with_failed_provisioning();
        let timeouts = VolumeLifecycle::DEFAULT_TIMEOUTS;

        let id = VolumeLifecycle.create(&vpc, &spec(), &timeouts).await.unwrap();
        let err = VolumeLifecycle
            .wait_created(&vpc, &id, &timeouts)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Wait(WaitError::UnexpectedState { ref state, .. }) if state == FAILED
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_not_found() {
        let vpc = FakeVpc::default().with_settle_polls(2);
        let timeouts = VolumeLifecycle::DEFAULT_TIMEOUTS;
        let id = VolumeLifecycle.create(&vpc, &spec(), &timeouts).await.unwrap();
        VolumeLifecycle
            .wait_created(&vpc, &id, &timeouts)
            .await
            .unwrap();

        VolumeLifecycle.delete(&vpc, &id, &timeouts).await.unwrap();
        assert_eq!(vpc.len(), 0);
        assert!(!VolumeLifecycle.exists(&vpc, &id).await.unwrap());

        // Already gone
        VolumeLifecycle.delete(&vpc, &id, &timeouts).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn short_timeout_expires() {
        let vpc = FakeVpc::default().with_settle_polls(100);
        let timeouts = Timeouts::uniform(Duration::from_secs(30));
        let id = VolumeLifecycle.create(&vpc, &spec(), &timeouts).await.unwrap();
        assert!(matches!(
            VolumeLifecycle.wait_created(&vpc, &id, &timeouts).await,
            Err(Error::Wait(WaitError::Timeout { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn resource_round_trip() {
        let vpc = Arc::new(FakeVpc::default().with_settle_polls(1));
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc.clone()));
        let mut diags = Diagnostics::default();

        let (planned, _) = resource
            .plan_create(&mut diags, Value::Value(config()), Value::Value(config()), Value::Null)
            .await
            .unwrap();
        let Value::Value(planned_state) = &planned else {
            panic!("planned state is null");
        };
        assert!(planned_state.crn.is_unknown());
        assert!(planned_state.capacity.is_unknown());

        let (created, _) = resource
            .create(&mut diags, planned, Value::Value(config()), Value::Null, Value::Null)
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        let Value::Value(state) = &created else {
            panic!("created state is null");
        };
        assert_eq!(state.status, Value::Value(Cow::Borrowed("available")));
        assert_eq!(state.capacity, Value::Value(DEFAULT_CAPACITY));
        assert_eq!(state.name, Value::Value(Cow::Borrowed("data")));
        assert!(!state.crn.is_null());

        let (read, _) = resource
            .read(&mut diags, created.clone(), Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_wait_keeps_the_volume_in_state() {
        let vpc = Arc::new(FakeVpc::default().with_failed_provisioning());
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc.clone()));
        let mut diags = Diagnostics::default();

        let (created, _) = resource
            .create(
                &mut diags,
                Value::Value(config()),
                Value::Value(config()),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        assert_eq!(diags.errors.len(), 1);
        let Value::Value(state) = created else {
            panic!("created state is null");
        };
        assert_eq!(state.status, Value::Value(Cow::Borrowed("failed")));
        assert!(!state.id.is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn resize_waits_for_available() {
        let vpc = FakeVpc::default().with_settle_polls(1);
        let timeouts = VolumeLifecycle::DEFAULT_TIMEOUTS;
        let id = VolumeLifecycle.create(&vpc, &spec(), &timeouts).await.unwrap();
        VolumeLifecycle
            .wait_created(&vpc, &id, &timeouts)
            .await
            .unwrap();
        let gets = vpc.gets();

        let planned = VolumeSpec {
            capacity: Some(200),
            ..spec()
        };
        VolumeLifecycle
            .update(&vpc, &id, &spec(), &planned, &timeouts)
            .await
            .unwrap();
        assert_eq!(vpc.gets(), gets + 2);
        let volume = vpc.volume(id.as_str()).unwrap();
        assert_eq!(volume.status.as_deref(), Some("available"));
        assert_eq!(volume.capacity, Some(200));
        assert_eq!(volume.bandwidth, Some(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn create_keeps_the_id_when_reads_fail() {
        let vpc = Arc::new(FakeVpc::default());
        vpc.fail_gets(500);
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc.clone()));
        let mut diags = Diagnostics::default();

        let (created, _) = resource
            .create(
                &mut diags,
                Value::Value(config()),
                Value::Value(config()),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        // Failed wait and failed refresh
        assert_eq!(diags.errors.len(), 2);
        let Value::Value(state) = created else {
            panic!("created state is null");
        };
        assert_eq!(state.id, Value::Value(Cow::Borrowed("r006-0")));
        assert_eq!(vpc.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_defaults_apply_to_created_volumes() {
        let vpc = Arc::new(FakeVpc::default());
        let provider = SessionConfig {
            zone: Some("us-south-2".to_owned()),
            resource_group: Some("rg-9".to_owned()),
            ..fake::config()
        };
        let session =
            fake::session_from(provider, vpc.clone(), Default::default(), Default::default());
        let resource = LifecycleResource::new(VolumeLifecycle, session);
        let mut diags = Diagnostics::default();
        let unzoned = VolumeState {
            zone: Value::Null,
            ..config()
        };

        let (planned, _) = resource
            .plan_create(
                &mut diags,
                Value::Value(unzoned.clone()),
                Value::Value(unzoned.clone()),
                Value::Null,
            )
            .await
            .unwrap();
        let (created, _) = resource
            .create(&mut diags, planned, Value::Value(unzoned), Value::Null, Value::Null)
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        let Value::Value(state) = created else {
            panic!("created state is null");
        };
        assert_eq!(state.zone, Value::Value(Cow::Borrowed("us-south-2")));
        assert_eq!(state.resource_group, Value::Value(Cow::Borrowed("rg-9")));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_tags_stay_empty() {
        let vpc = Arc::new(FakeVpc::default());
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc));
        let mut diags = Diagnostics::default();
        let untagged = VolumeState {
            tags: Value::Value(BTreeSet::new()),
            ..config()
        };

        let (planned, _) = resource
            .plan_create(
                &mut diags,
                Value::Value(untagged.clone()),
                Value::Value(untagged.clone()),
                Value::Null,
            )
            .await
            .unwrap();
        let (created, _) = resource
            .create(&mut diags, planned, Value::Value(untagged), Value::Null, Value::Null)
            .await
            .unwrap();
        let Value::Value(state) = &created else {
            panic!("created state is null");
        };
        assert_eq!(state.tags, Value::Value(BTreeSet::new()));

        let (read, _) = resource
            .read(&mut diags, created.clone(), Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, created);
        assert!(diags.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn read_of_deleted_volume_clears_state() {
        let vpc = Arc::new(FakeVpc::default());
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc.clone()));
        let mut diags = Diagnostics::default();

        let (created, _) = resource
            .create(
                &mut diags,
                Value::Value(config()),
                Value::Value(config()),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        vpc.remove("r006-0");

        let (read, _) = resource
            .read(&mut diags, created, Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, Value::Null);
        assert!(diags.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn exists_reports_service_failures() {
        let vpc = Arc::new(FakeVpc::default());
        let resource = LifecycleResource::new(VolumeLifecycle, fake::session_with_vpc(vpc.clone()));
        let mut diags = Diagnostics::default();
        let (created, _) = resource
            .create(
                &mut diags,
                Value::Value(config()),
                Value::Value(config()),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();

        let id = OpaqueId("r006-0".to_owned());
        assert!(VolumeLifecycle.exists(vpc.as_ref(), &id).await.unwrap());

        vpc.fail_requests(503);
        assert!(VolumeLifecycle.exists(vpc.as_ref(), &id).await.is_err());
        assert!(resource
            .destroy(&mut diags, created, Value::Null, Value::Null)
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(vpc.len(), 1);
    }

    #[tokio::test]
    async fn data_source_by_name() {
        let vpc = Arc::new(FakeVpc::default());
        vpc.insert(Volume {
            id: "r006-9".to_owned(),
            name: Some("logs".to_owned()),
            capacity: Some(500),
            ..Default::default()
        });
        let data_source = LookupDataSource::new(VolumeLookup, fake::session_with_vpc(vpc));
        let mut diags = Diagnostics::default();

        let state = data_source
            .read(
                &mut diags,
                VolumeDataState {
                    name: Value::Value(Cow::Borrowed("logs")),
                    ..Default::default()
                },
                Value::Null,
            )
            .await
            .unwrap();
        assert_eq!(state.id, Value::Value(Cow::Borrowed("r006-9")));
        assert_eq!(state.capacity, Value::Value(500));
        assert_eq!(state.iops, Value::Null);
    }
}
