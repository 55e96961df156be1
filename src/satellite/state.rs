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
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::flex::{self, ValueBool};
use crate::lifecycle::{trigger_if_changed, StateModel};
use crate::timeouts::StateTimeouts;
use crate::utils::{validate_one_of, validate_range, WithSchema, WithValidate};

use super::client::Endpoint;

pub const CONNECTION_TYPES: &[&str] = &["cloud", "location"];
pub const PROTOCOLS: &[&str] = &["udp", "tcp", "tls", "http", "https", "http-tunnel"];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointState<'a> {
    pub id: ValueString<'a>,
    pub location: ValueString<'a>,
    pub connection_type: ValueString<'a>,
    pub display_name: ValueString<'a>,
    pub server_host: ValueString<'a>,
    pub server_port: ValueNumber,
    pub sni: ValueString<'a>,
    pub client_protocol: ValueString<'a>,
    pub client_mutual_auth: ValueBool,
    pub server_protocol: ValueString<'a>,
    pub server_mutual_auth: ValueBool,
    pub reject_unauth: ValueBool,
    pub timeout: ValueNumber,
    pub created_by: ValueString<'a>,
    pub endpoint_id: ValueString<'a>,
    pub crn: ValueString<'a>,
    pub service_name: ValueString<'a>,
    pub client_host: ValueString<'a>,
    pub client_port: ValueNumber,
    pub connector_port: ValueNumber,
    pub status: ValueString<'a>,
    pub created_at: ValueString<'a>,
    pub last_change: ValueString<'a>,
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

impl<'a> WithSchema for EndpointState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        use AttributeType as T;

        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(T::String, "`<location>/<endpoint_id>`", Computed),
                    "location" => attribute(T::String, "Satellite location id. Changing it creates a new endpoint", Required),
                    "connection_type" => attribute(T::String, "Where the destination runs: `cloud` or `location`", Required),
                    "display_name" => attribute(T::String, "Display name of the endpoint", Required),
                    "server_host" => attribute(T::String, "Host name or IP address of the destination", Required),
                    "server_port" => attribute(T::Number, "Port of the destination (1 to 65535)", Required),
                    "sni" => attribute(T::String, "Server name indication used by TLS", Optional),
                    "client_protocol" => attribute(T::String, "Protocol used by clients to reach the endpoint", Required),
                    "client_mutual_auth" => attribute(T::Bool, "Whether clients must present a certificate", OptionalComputed),
                    "server_protocol" => attribute(T::String, "Protocol used to reach the destination", OptionalComputed),
                    "server_mutual_auth" => attribute(T::Bool, "Whether the destination requires a client certificate", OptionalComputed),
                    "reject_unauth" => attribute(T::Bool, "Reject destinations with an unauthorized certificate", OptionalComputed),
                    "timeout" => attribute(T::Number, "Inactivity timeout of connections in seconds (1 to 180)", OptionalComputed),
                    "created_by" => attribute(T::String, "Service or person that created the endpoint", OptionalComputed),
                    "endpoint_id" => attribute(T::String, "Endpoint id within the location", Computed),
                    "crn" => attribute(T::String, "CRN of the endpoint", Computed),
                    "service_name" => attribute(T::String, "Service name of the endpoint", Computed),
                    "client_host" => attribute(T::String, "Host name clients connect to", Computed),
                    "client_port" => attribute(T::Number, "Port clients connect to", Computed),
                    "connector_port" => attribute(T::Number, "Port of the location connector", Computed),
                    "status" => attribute(T::String, "Status of the endpoint", Computed),
                    "created_at" => attribute(T::String, "Creation time of the endpoint", Computed),
                    "last_change" => attribute(T::String, "Time of the last change of the endpoint", Computed),
                    "timeouts" => StateTimeouts::attribute(),
                },
                description: Description::plain("Satellite Link endpoint"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for EndpointState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        if let Value::Value(name) = &self.display_name {
            if name.trim().is_empty() {
                diags.error(
                    "Invalid `display_name`",
                    "`display_name` must not be blank",
                    AttributePath::new("display_name"),
                );
            }
        }
        validate_one_of(diags, &self.connection_type, CONNECTION_TYPES, "connection_type");
        validate_one_of(diags, &self.client_protocol, PROTOCOLS, "client_protocol");
        validate_one_of(diags, &self.server_protocol, PROTOCOLS, "server_protocol");
        validate_range(diags, &self.server_port, 1..=65535, "server_port");
        validate_range(diags, &self.timeout, 1..=180, "timeout");
    }
}

impl<'a> EndpointState<'a> {
    /// Whether an attribute that can be patched differs from `prior`
    fn patched_from(&self, prior: &Self) -> bool {
        self.display_name != prior.display_name
            || self.server_host != prior.server_host
            || self.server_port != prior.server_port
            || self.sni != prior.sni
            || self.client_protocol != prior.client_protocol
            || self.client_mutual_auth != prior.client_mutual_auth
            || self.server_protocol != prior.server_protocol
            || self.server_mutual_auth != prior.server_mutual_auth
            || self.reject_unauth != prior.reject_unauth
            || self.timeout != prior.timeout
    }

    pub(super) fn flatten(&mut self, endpoint: Endpoint) {
        self.location = flex::string(endpoint.location_id);
        self.connection_type = flex::string(endpoint.conn_type);
        self.display_name = flex::string(endpoint.display_name);
        self.server_host = flex::string(endpoint.server_host);
        self.server_port = flex::number(endpoint.server_port);
        self.sni = flex::string_keeping(endpoint.sni, &self.sni);
        self.client_protocol = flex::string(endpoint.client_protocol);
        self.client_mutual_auth = flex::boolean(endpoint.client_mutual_auth);
        self.server_protocol = flex::string(endpoint.server_protocol);
        self.server_mutual_auth = flex::boolean(endpoint.server_mutual_auth);
        self.reject_unauth = flex::boolean(endpoint.reject_unauth);
        self.timeout = flex::number(endpoint.timeout);
        self.created_by = flex::string(endpoint.created_by);
        self.endpoint_id = flex::string(Some(endpoint.endpoint_id));
        self.crn = flex::string(endpoint.crn);
        self.service_name = flex::string(endpoint.service_name);
        self.client_host = flex::string(endpoint.client_host);
        self.client_port = flex::number(endpoint.client_port);
        self.connector_port = flex::number(endpoint.connector_port);
        self.status = flex::string(endpoint.status);
        self.created_at = flex::string(endpoint.created_at);
        self.last_change = flex::string(endpoint.last_change);
    }
}

impl<'a> StateModel<'a> for EndpointState<'a> {
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
            flex::unknown_if_null(&mut self.client_mutual_auth);
            flex::unknown_if_null(&mut self.server_protocol);
            flex::unknown_if_null(&mut self.server_mutual_auth);
            flex::unknown_if_null(&mut self.reject_unauth);
            flex::unknown_if_null(&mut self.timeout);
            flex::unknown_if_null(&mut self.created_by);
            self.endpoint_id = Value::Unknown;
            self.crn = Value::Unknown;
            self.service_name = Value::Unknown;
            self.client_host = Value::Unknown;
            self.client_port = Value::Unknown;
            self.connector_port = Value::Unknown;
            self.status = Value::Unknown;
            self.created_at = Value::Unknown;
            self.last_change = Value::Unknown;
            return;
        };

        flex::carry(&mut self.client_mutual_auth, Some(&prior.client_mutual_auth));
        flex::carry(&mut self.server_protocol, Some(&prior.server_protocol));
        flex::carry(&mut self.server_mutual_auth, Some(&prior.server_mutual_auth));
        flex::carry(&mut self.reject_unauth, Some(&prior.reject_unauth));
        flex::carry(&mut self.timeout, Some(&prior.timeout));
        flex::carry(&mut self.created_by, Some(&prior.created_by));
        self.endpoint_id = prior.endpoint_id.clone();
        self.crn = prior.crn.clone();
        self.service_name = prior.service_name.clone();
        self.client_host = prior.client_host.clone();
        self.client_port = prior.client_port.clone();
        self.connector_port = prior.connector_port.clone();
        self.status = prior.status.clone();
        self.created_at = prior.created_at.clone();
        self.last_change = if self.patched_from(prior) {
            Value::Unknown
        } else {
            prior.last_change.clone()
        };
    }

    fn replace_triggers(&self, planned: &Self) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        trigger_if_changed(&mut triggers, "location", &self.location, &planned.location);
        trigger_if_changed(
            &mut triggers,
            "connection_type",
            &self.connection_type,
            &planned.connection_type,
        );
        trigger_if_changed(&mut triggers, "created_by", &self.created_by, &planned.created_by);
        triggers
    }
}
