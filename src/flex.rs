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

//! Conversions between service structs and Terraform values.
//!
//! Flatteners map absent fields to null, expanders treat null and unknown
//! values as absent.

use std::borrow::Cow;
use std::collections::BTreeSet;

use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

pub type ValueBool = Value<bool>;
pub type ValueStringSet<'a> = Value<BTreeSet<ValueString<'a>>>;

pub fn string<'a>(value: Option<String>) -> ValueString<'a> {
    match value {
        Some(value) => Value::Value(Cow::Owned(value)),
        None => Value::Null,
    }
}

pub fn number(value: Option<i64>) -> ValueNumber {
    value.map_or(Value::Null, Value::Value)
}

pub fn boolean(value: Option<bool>) -> ValueBool {
    value.map_or(Value::Null, Value::Value)
}

/// Empty sets are flattened to null so an unset attribute stays unset
pub fn string_set<'a>(values: Vec<String>) -> ValueStringSet<'a> {
    if values.is_empty() {
        Value::Null
    } else {
        Value::Value(
            values
                .into_iter()
                .map(|v| Value::Value(Cow::Owned(v)))
                .collect(),
        )
    }
}

/// Like [`string_set`], but an empty set configured explicitly stays empty
pub fn string_set_keeping<'a>(
    values: Vec<String>,
    current: &ValueStringSet<'_>,
) -> ValueStringSet<'a> {
    match current {
        Value::Value(set) if set.is_empty() && values.is_empty() => Value::Value(BTreeSet::new()),
        _ => string_set(values),
    }
}

/// Empty strings flatten to null unless the current value is already `""`
pub fn string_keeping<'a>(value: Option<String>, current: &ValueString<'_>) -> ValueString<'a> {
    match value.filter(|value| !value.is_empty()) {
        Some(value) => Value::Value(Cow::Owned(value)),
        None if current.as_deref_option() == Some("") => Value::Value(Cow::Borrowed("")),
        None => Value::Null,
    }
}

pub fn expand_string(value: &ValueString<'_>) -> Option<String> {
    value.as_deref_option().map(str::to_owned)
}

pub fn expand_number(value: &ValueNumber) -> Option<i64> {
    match value {
        Value::Value(v) => Some(*v),
        _ => None,
    }
}

pub fn expand_bool(value: &ValueBool) -> Option<bool> {
    match value {
        Value::Value(v) => Some(*v),
        _ => None,
    }
}

pub fn expand_string_set(value: &ValueStringSet<'_>) -> Vec<String> {
    value
        .iter()
        .flatten()
        .filter_map(|v| v.as_deref_option().map(str::to_owned))
        .collect()
}

/// Expand an attribute that must be known before calling the service
pub fn required_string(
    value: &ValueString<'_>,
    diags: &mut Diagnostics,
    attr: &str,
) -> Option<String> {
    match value {
        Value::Value(v) => Some(v.to_string()),
        Value::Null => {
            diags.error(
                format!("Missing `{attr}`"),
                format!("`{attr}` is required"),
                AttributePath::new(attr),
            );
            None
        }
        Value::Unknown => {
            diags.error(
                format!("Unknown `{attr}`"),
                format!("`{attr}` must be known when applying"),
                AttributePath::new(attr),
            );
            None
        }
    }
}

/// Planned value of an optional computed attribute left unset in the config
pub fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

/// Keep the prior value of a computed attribute, unknown when there is none
pub fn carry<T: Clone>(value: &mut Value<T>, prior: Option<&Value<T>>) {
    if value.is_null() || value.is_unknown() {
        *value = prior.cloned().unwrap_or(Value::Unknown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_flatten_to_null() {
        assert_eq!(string(None), Value::Null);
        assert_eq!(number(Some(10)), Value::Value(10));
        assert_eq!(boolean(None), Value::Null);
        assert_eq!(string_set(vec![]), Value::Null);

        let tags = string_set(vec!["env:dev".to_owned(), "team:a".to_owned()]);
        assert_eq!(expand_string_set(&tags), vec!["env:dev", "team:a"]);
    }

    #[test]
    fn explicit_empty_values_are_kept() {
        let empty: ValueStringSet = Value::Value(BTreeSet::new());
        assert_eq!(string_set_keeping(vec![], &empty), empty);
        assert_eq!(string_set_keeping(vec![], &Value::Null), Value::Null);
        assert_eq!(string_set_keeping(vec![], &Value::Unknown), Value::Null);
        assert_eq!(
            string_set_keeping(vec!["env:dev".to_owned()], &empty),
            string_set(vec!["env:dev".to_owned()])
        );

        let blank = Value::Value(Cow::Borrowed(""));
        assert_eq!(string_keeping(None, &blank), blank);
        assert_eq!(string_keeping(Some(String::new()), &blank), blank);
        assert_eq!(string_keeping(Some(String::new()), &Value::Null), Value::Null);
        assert_eq!(
            string_keeping(Some("x".to_owned()), &blank),
            Value::Value(Cow::Borrowed("x"))
        );
    }

    #[test]
    fn unknowns_expand_to_none() {
        assert_eq!(expand_string(&Value::Unknown), None);
        assert_eq!(expand_number(&Value::Null), None);
        assert_eq!(expand_bool(&Value::Value(true)), Some(true));
    }

    #[test]
    fn required_values_report_diagnostics() {
        let mut diags = Diagnostics::default();
        assert_eq!(
            required_string(&Value::Value(Cow::Borrowed("demo")), &mut diags, "name"),
            Some("demo".to_owned())
        );
        assert!(diags.errors.is_empty());
        assert_eq!(required_string(&Value::Null, &mut diags, "name"), None);
        assert_eq!(required_string(&Value::Unknown, &mut diags, "name"), None);
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn plan_helpers() {
        let mut v: ValueNumber = Value::Null;
        unknown_if_null(&mut v);
        assert!(v.is_unknown());

        let mut v: ValueNumber = Value::Null;
        carry(&mut v, Some(&Value::Value(3)));
        assert_eq!(v, Value::Value(3));

        let mut v: ValueNumber = Value::Value(7);
        carry(&mut v, Some(&Value::Value(3)));
        assert_eq!(v, Value::Value(7));

        let mut v: ValueNumber = Value::Null;
        carry(&mut v, None);
        assert!(v.is_unknown());
    }
}
