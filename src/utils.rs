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

use std::cell::RefCell;

use tf_provider::{AttributePath, Diagnostics, Schema, Value};

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    fn validate(&self, diags: &mut Diagnostics);
}

/// Reports an attribute error when a known number falls outside `range`.
pub(crate) fn validate_range(
    diags: &mut Diagnostics,
    value: &Value<i64>,
    range: std::ops::RangeInclusive<i64>,
    attr: &str,
) {
    if let Value::Value(x) = value {
        if !range.contains(x) {
            diags.error(
                format!("`{attr}` is out of range"),
                format!(
                    "`{attr}` must be between {} and {}, got {x}",
                    range.start(),
                    range.end()
                ),
                AttributePath::new(attr),
            );
        }
    }
}

/// Reports an attribute error when a known string is not one of `allowed`.
pub(crate) fn validate_one_of(
    diags: &mut Diagnostics,
    value: &tf_provider::value::ValueString<'_>,
    allowed: &[&str],
    attr: &str,
) {
    if let Value::Value(x) = value {
        let x: &str = x;
        if !allowed.contains(&x) {
            diags.error(
                format!("Invalid `{attr}`"),
                format!(
                    "`{attr}` must be one of [{}], got `{x}`",
                    allowed.iter().join_with(", ")
                ),
                AttributePath::new(attr),
            );
        }
    }
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}
