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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tf_provider::{
    map,
    schema::{Attribute, AttributeConstraint, AttributeType, Description},
    value::{Value, ValueString},
    AttributePath, Diagnostics,
};

/// Maximal durations of the lifecycle operations of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn uniform(duration: Duration) -> Self {
        Self {
            create: duration,
            update: duration,
            delete: duration,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTimeouts<'a> {
    pub create: ValueString<'a>,
    pub update: ValueString<'a>,
    pub delete: ValueString<'a>,
}

impl<'a> StateTimeouts<'a> {
    pub fn attribute() -> Attribute {
        let duration = |op: &str| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(format!(
                "Maximal duration of the {op} operation (eg: `30s`, `10m`, `1h30m`)"
            )),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        };
        Attribute {
            attr_type: AttributeType::AttributeSingle(map! {
                "create" => duration("create"),
                "update" => duration("update"),
                "delete" => duration("delete"),
            }),
            description: Description::plain("Operation timeouts"),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        }
    }
}

/// Resolve the `timeouts` attribute, falling back on `defaults` for unset values
pub fn resolve(
    diags: &mut Diagnostics,
    timeouts: &Value<StateTimeouts<'_>>,
    defaults: Timeouts,
) -> Option<Timeouts> {
    let Value::Value(timeouts) = timeouts else {
        return Some(defaults);
    };

    let mut resolve_one = |value: &ValueString<'_>, name: &str, default: Duration| match value {
        Value::Value(text) => match parse_duration(text) {
            Ok(duration) => Some(duration),
            Err(err) => {
                diags.error(
                    "Invalid timeout",
                    err.to_string(),
                    AttributePath::new("timeouts").attribute(name),
                );
                None
            }
        },
        _ => Some(default),
    };

    let create = resolve_one(&timeouts.create, "create", defaults.create);
    let update = resolve_one(&timeouts.update, "update", defaults.update);
    let delete = resolve_one(&timeouts.delete, "delete", defaults.delete);
    Some(Timeouts {
        create: create?,
        update: update?,
        delete: delete?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration `{0}`")]
    Invalid(String),
    #[error("missing unit in duration `{0}`")]
    MissingUnit(String),
    #[error("unknown unit `{unit}` in duration `{input}`")]
    UnknownUnit { unit: String, input: String },
}

/// Parse a duration written like Go's `time.ParseDuration` (`"1h30m"`, `"45s"`)
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(DurationError::Invalid(input.to_owned()));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = s;
    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !is_number(c))
            .ok_or_else(|| DurationError::MissingUnit(input.to_owned()))?;
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_owned()))?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let nanos: u64 = match &rest[..unit_end] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            unit => {
                return Err(DurationError::UnknownUnit {
                    unit: unit.to_owned(),
                    input: input.to_owned(),
                })
            }
        };
        total += Duration::from_nanos((value * nanos as f64).round() as u64);
        rest = &rest[unit_end..];
    }
    Ok(total)
}
