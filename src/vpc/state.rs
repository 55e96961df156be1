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

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::flex::{self, ValueStringSet};
use crate::lifecycle::{trigger_if_changed, StateModel};
use crate::timeouts::StateTimeouts;
use crate::utils::{validate_one_of, validate_range, WithSchema, WithValidate};

use super::client::{StatusReason, Volume};

pub const PROFILES: &[&str] = &[
    "general-purpose",
    "5iops-tier",
    "10iops-tier",
    "custom",
    "sdp",
];

lazy_static! {
    static ref NAME: Regex = Regex::new("^([a-z]|[a-z][-a-z0-9]*[a-z0-9])$").unwrap();
    static ref TAG: Regex = Regex::new(
        "^([A-Za-z0-9_.-]|[A-Za-z0-9_.-][A-Za-z0-9_ .-]*[A-Za-z0-9_.-]):([A-Za-z0-9_.-]|[A-Za-z0-9_.-][A-Za-z0-9_ .-]*[A-Za-z0-9_.-])$"
    )
    .unwrap();
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReasonState<'a> {
    pub code: ValueString<'a>,
    pub message: ValueString<'a>,
    pub more_info: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub profile: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub capacity: ValueNumber,
    pub iops: ValueNumber,
    pub encryption_key: ValueString<'a>,
    pub resource_group: ValueString<'a>,
    pub source_snapshot: ValueString<'a>,
    pub tags: ValueStringSet<'a>,
    pub crn: ValueString<'a>,
    pub bandwidth: ValueNumber,
    pub encryption_type: ValueString<'a>,
    pub status: ValueString<'a>,
    pub status_reasons: ValueList<Value<StatusReasonState<'a>>>,
    pub health_state: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub timeouts: Value<StateTimeouts<'a>>,
}

fn attribute(
    attr_type: AttributeType,
    description: &str,
    constraint: AttributeConstraint,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn status_reason_type() -> AttributeType {
    AttributeType::Object(map! {
        "code" => AttributeType::String,
        "message" => AttributeType::String,
        "more_info" => AttributeType::String,
    })
}

impl<'a> WithSchema for VolumeState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        use AttributeType as T;

        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(T::String, "Volume id", Computed),
                    "name" => attribute(T::String, "Volume name", Required),
                    "profile" => attribute(T::String, "Volume profile name", Required),
                    "zone" => attribute(
                        T::String,
                        "Zone of the volume, the provider zone when unset. Changing it creates a new volume",
                        OptionalComputed,
                    ),
                    "capacity" => attribute(T::Number, "Capacity of the volume in GB (10 to 16000)", OptionalComputed),
                    "iops" => attribute(T::Number, "Bandwidth in IOPS of a `custom` volume (100 to 48000)", OptionalComputed),
                    "encryption_key" => attribute(T::String, "CRN of the root key encrypting the volume", Optional),
                    "resource_group" => attribute(
                        T::String,
                        "Resource group id of the volume, the provider resource group when unset",
                        OptionalComputed,
                    ),
                    "source_snapshot" => attribute(T::String, "Id of the snapshot the volume is restored from", Optional),
                    "tags" => attribute(
                        T::Set(Box::new(T::String)),
                        "User tags of the volume (`key:value`)",
                        Optional,
                    ),
                    "crn" => attribute(T::String, "CRN of the volume", Computed),
                    "bandwidth" => attribute(T::Number, "Maximum bandwidth in megabits per second", Computed),
                    "encryption_type" => attribute(T::String, "`provider_managed` or `user_managed`", Computed),
                    "status" => attribute(T::String, "Status of the volume", Computed),
                    "status_reasons" => attribute(
                        T::List(Box::new(status_reason_type())),
                        "Reasons of the current status",
                        Computed,
                    ),
                    "health_state" => attribute(T::String, "Health state of the volume", Computed),
                    "created_at" => attribute(T::String, "Creation date of the volume", Computed),
                    "timeouts" => StateTimeouts::attribute(),
                },
                description: Description::plain("VPC block storage volume"),
                ..Default::default()
            },
        }
    }
}

pub(super) fn validate_name(diags: &mut Diagnostics, name: &ValueString<'_>) {
    if let Value::Value(name) = name {
        if name.len() > 63 || !NAME.is_match(name) {
            diags.error(
                "Invalid `name`",
                format!(
                    "`{name}` must be 1 to 63 lowercase letters, digits or dashes, starting with a letter"
                ),
                AttributePath::new("name"),
            );
        }
    }
}

impl<'a> WithValidate for VolumeState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
        validate_one_of(diags, &self.profile, PROFILES, "profile");
        validate_range(diags, &self.capacity, 10..=16000, "capacity");
        validate_range(diags, &self.iops, 100..=48000, "iops");

        for tag in self.tags.iter().flatten() {
            if let Value::Value(tag) = tag {
                if tag.len() > 128 || !TAG.is_match(tag) {
                    diags.error(
                        "Invalid tag",
                        format!("`{tag}` is not a valid `key:value` tag"),
                        AttributePath::new("tags"),
                    );
                }
            }
        }

        if matches!(self.iops, Value::Value(_))
            && self.profile.as_deref_option().map_or(false, |p| !matches!(p, "custom" | "sdp"))
        {
            diags.error(
                "`iops` requires a custom or sdp profile",
                "`iops` can only be set when `profile` is `custom` or `sdp`",
                AttributePath::new("iops"),
            );
        }
    }
}

impl<'a> StateModel<'a> for VolumeState<'a> {
    fn id(&self) -> &ValueString<'a> {
        &self.id
    }

    fn set_id(&mut self, id: ValueString<'a>) {
        self.id = id;
    }

    fn timeouts(&self) -> &Value<StateTimeouts<'a>> {
        &self.timeouts
    }

    fn plan_computed(&mut self, prior: Option<&Self>) {
        let Some(prior) = prior else {
            flex::unknown_if_null(&mut self.zone);
            flex::unknown_if_null(&mut self.capacity);
            flex::unknown_if_null(&mut self.iops);
            flex::unknown_if_null(&mut self.resource_group);
            self.crn = Value::Unknown;
            self.bandwidth = Value::Unknown;
            self.encryption_type = Value::Unknown;
            self.status = Value::Unknown;
            self.status_reasons = Value::Unknown;
            self.health_state = Value::Unknown;
            self.created_at = Value::Unknown;
            return;
        };

        flex::carry(&mut self.zone, Some(&prior.zone));
        flex::carry(&mut self.capacity, Some(&prior.capacity));
        flex::carry(&mut self.iops, Some(&prior.iops));
        flex::carry(&mut self.resource_group, Some(&prior.resource_group));
        flex::carry(&mut self.crn, Some(&prior.crn));
        flex::carry(&mut self.encryption_type, Some(&prior.encryption_type));
        flex::carry(&mut self.created_at, Some(&prior.created_at));

        let resized = self.capacity != prior.capacity
            || self.iops != prior.iops
            || self.profile != prior.profile;
        if resized {
            self.bandwidth = Value::Unknown;
            self.status = Value::Unknown;
            self.status_reasons = Value::Unknown;
            self.health_state = Value::Unknown;
        } else {
            self.bandwidth = prior.bandwidth.clone();
            self.status = prior.status.clone();
            self.status_reasons = prior.status_reasons.clone();
            self.health_state = prior.health_state.clone();
        }
    }

    fn replace_triggers(&self, planned: &Self) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        trigger_if_changed(&mut triggers, "zone", &self.zone, &planned.zone);
        trigger_if_changed(
            &mut triggers,
            "encryption_key",
            &self.encryption_key,
            &planned.encryption_key,
        );
        trigger_if_changed(
            &mut triggers,
            "resource_group",
            &self.resource_group,
            &planned.resource_group,
        );
        trigger_if_changed(
            &mut triggers,
            "source_snapshot",
            &self.source_snapshot,
            &planned.source_snapshot,
        );
        triggers
    }
}

fn status_reasons<'a>(reasons: Vec<StatusReason>) -> ValueList<Value<StatusReasonState<'a>>> {
    Value::Value(
        reasons
            .into_iter()
            .map(|reason| {
                Value::Value(StatusReasonState {
                    code: flex::string(Some(reason.code)),
                    message: flex::string(Some(reason.message)),
                    more_info: flex::string(reason.more_info),
                })
            })
            .collect(),
    )
}

/// Attributes shared by the volume resource and data source
macro_rules! flatten_computed {
    ($state:expr, $volume:expr) => {{
        let volume: Volume = $volume;
        let state = $state;
        state.id = flex::string(Some(volume.id));
        state.name = flex::string(volume.name);
        state.profile = flex::string(volume.profile.map(|p| p.name));
        state.zone = flex::string(volume.zone.map(|z| z.name));
        state.capacity = flex::number(volume.capacity);
        state.iops = flex::number(volume.iops);
        state.encryption_key = flex::string(volume.encryption_key.map(|k| k.crn));
        state.resource_group = flex::string(volume.resource_group.map(|g| g.id));
        state.source_snapshot = flex::string(volume.source_snapshot.map(|s| s.id));
        state.tags = flex::string_set_keeping(volume.user_tags, &state.tags);
        state.crn = flex::string(volume.crn);
        state.bandwidth = flex::number(volume.bandwidth);
        state.encryption_type = flex::string(volume.encryption);
        state.status = flex::string(volume.status);
        state.status_reasons = status_reasons(volume.status_reasons);
        state.health_state = flex::string(volume.health_state);
        state.created_at = flex::string(volume.created_at);
    }};
}

impl<'a> VolumeState<'a> {
    pub(super) fn flatten(&mut self, volume: Volume) {
        flatten_computed!(self, volume);
    }
}

/// Volume looked up by name
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDataState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub profile: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub capacity: ValueNumber,
    pub iops: ValueNumber,
    pub encryption_key: ValueString<'a>,
    pub resource_group: ValueString<'a>,
    pub source_snapshot: ValueString<'a>,
    pub tags: ValueStringSet<'a>,
    pub crn: ValueString<'a>,
    pub bandwidth: ValueNumber,
    pub encryption_type: ValueString<'a>,
    pub status: ValueString<'a>,
    pub status_reasons: ValueList<Value<StatusReasonState<'a>>>,
    pub health_state: ValueString<'a>,
    pub created_at: ValueString<'a>,
}

impl<'a> WithSchema for VolumeDataState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType as T;

        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(T::String, "Volume id", Computed),
                    "name" => attribute(T::String, "Name of the volume to look up", Required),
                    "profile" => attribute(T::String, "Volume profile name", Computed),
                    "zone" => attribute(T::String, "Zone of the volume", Computed),
                    "capacity" => attribute(T::Number, "Capacity of the volume in GB", Computed),
                    "iops" => attribute(T::Number, "Bandwidth in IOPS", Computed),
                    "encryption_key" => attribute(T::String, "CRN of the root key encrypting the volume", Computed),
                    "resource_group" => attribute(T::String, "Resource group id of the volume", Computed),
                    "source_snapshot" => attribute(T::String, "Id of the snapshot the volume was restored from", Computed),
                    "tags" => attribute(T::Set(Box::new(T::String)), "User tags of the volume", Computed),
                    "crn" => attribute(T::String, "CRN of the volume", Computed),
                    "bandwidth" => attribute(T::Number, "Maximum bandwidth in megabits per second", Computed),
                    "encryption_type" => attribute(T::String, "`provider_managed` or `user_managed`", Computed),
                    "status" => attribute(T::String, "Status of the volume", Computed),
                    "status_reasons" => attribute(
                        T::List(Box::new(status_reason_type())),
                        "Reasons of the current status",
                        Computed,
                    ),
                    "health_state" => attribute(T::String, "Health state of the volume", Computed),
                    "created_at" => attribute(T::String, "Creation date of the volume", Computed),
                },
                description: Description::plain("Look up a VPC block storage volume by name"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for VolumeDataState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
    }
}

impl<'a> VolumeDataState<'a> {
    pub(super) fn flatten(&mut self, volume: Volume) {
        flatten_computed!(self, volume);
    }
}
