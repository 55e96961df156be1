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

use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::flex;
use crate::lifecycle::{trigger_if_changed, StateModel};
use crate::timeouts::StateTimeouts;
use crate::utils::{WithSchema, WithValidate};

use super::client::Namespace;

pub const DEFAULT_PLAN: &str = "functions-base-plan";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub resource_group_id: ValueString<'a>,
    pub resource_plan_id: ValueString<'a>,
    pub location: ValueString<'a>,
    pub timeouts: Value<StateTimeouts<'a>>,
}

fn string(description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

impl<'a> WithSchema for NamespaceState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => string("Namespace id", AttributeConstraint::Computed),
                    "name" => string("Name of the namespace", AttributeConstraint::Required),
                    "description" => string("Description of the namespace", AttributeConstraint::Optional),
                    "resource_group_id" => string(
                        "Resource group the namespace belongs to. Changing it creates a new namespace",
                        AttributeConstraint::Required,
                    ),
                    "resource_plan_id" => string(
                        "Resource plan of the namespace (default `functions-base-plan`)",
                        AttributeConstraint::OptionalComputed,
                    ),
                    "location" => string("Region of the namespace", AttributeConstraint::Computed),
                    "timeouts" => StateTimeouts::attribute(),
                },
                description: Description::plain("IBM Cloud Functions namespace"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for NamespaceState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
    }
}

pub(super) fn validate_name(diags: &mut Diagnostics, name: &ValueString<'_>) {
    if let Value::Value(name) = name {
        if name.trim().is_empty() {
            diags.error(
                "Invalid `name`",
                "`name` must not be blank",
                AttributePath::new("name"),
            );
        }
    }
}

impl<'a> StateModel<'a> for NamespaceState<'a> {
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
        match prior {
            None => {
                flex::unknown_if_null(&mut self.resource_plan_id);
                self.location = Value::Unknown;
            }
            Some(prior) => {
                flex::carry(&mut self.resource_plan_id, Some(&prior.resource_plan_id));
                flex::carry(&mut self.location, Some(&prior.location));
            }
        }
    }

    fn replace_triggers(&self, planned: &Self) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        trigger_if_changed(
            &mut triggers,
            "resource_group_id",
            &self.resource_group_id,
            &planned.resource_group_id,
        );
        trigger_if_changed(
            &mut triggers,
            "resource_plan_id",
            &self.resource_plan_id,
            &planned.resource_plan_id,
        );
        triggers
    }
}

impl<'a> NamespaceState<'a> {
    pub(super) fn flatten(&mut self, namespace: Namespace) {
        self.id = flex::string(Some(namespace.id));
        self.name = flex::string(namespace.name);
        self.description = flex::string_keeping(namespace.description, &self.description);
        self.resource_group_id = flex::string(namespace.resource_group_id);
        self.resource_plan_id = flex::string(namespace.resource_plan_id);
        self.location = flex::string(namespace.location);
    }
}

/// Configuration and result of the namespace data source
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDataState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub resource_group_id: ValueString<'a>,
    pub resource_plan_id: ValueString<'a>,
    pub location: ValueString<'a>,
}

impl<'a> WithSchema for NamespaceDataState<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => string("Namespace id", AttributeConstraint::Computed),
                    "name" => string("Name of the namespace to look up", AttributeConstraint::Required),
                    "description" => string("Description of the namespace", AttributeConstraint::Computed),
                    "resource_group_id" => string("Resource group of the namespace", AttributeConstraint::Computed),
                    "resource_plan_id" => string("Resource plan of the namespace", AttributeConstraint::Computed),
                    "location" => string("Region of the namespace", AttributeConstraint::Computed),
                },
                description: Description::plain("Look up an IBM Cloud Functions namespace by name"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for NamespaceDataState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        validate_name(diags, &self.name);
    }
}

impl<'a> NamespaceDataState<'a> {
    pub(super) fn flatten(&mut self, namespace: Namespace) {
        self.id = flex::string(Some(namespace.id));
        self.description = flex::string_keeping(namespace.description, &self.description);
        self.resource_group_id = flex::string(namespace.resource_group_id);
        self.resource_plan_id = flex::string(namespace.resource_plan_id);
        self.location = flex::string(namespace.location);
    }
}
