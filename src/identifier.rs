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

use thiserror::Error;

use crate::utils::DisplayJoinable;

pub const SEPARATOR: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("the resource id is empty")]
    Empty,
    #[error("malformed resource id `{id}`: expected {expected} `/`-separated parts, found {found}")]
    PartCount {
        id: String,
        expected: usize,
        found: usize,
    },
    #[error("malformed resource id `{id}`: part {index} is not valid UTF-8 once decoded")]
    Encoding { id: String, index: usize },
}

/// Identifier stored in the `id` attribute of a resource.
///
/// `decode(encode(id))` must give back `id`.
pub trait ResourceId: Sized + Clone + std::fmt::Debug + Send + Sync {
    fn encode(&self) -> String;
    fn decode(id: &str) -> Result<Self, IdError>;
}

/// Identifier made of a single remote id, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueId(pub String);

impl OpaqueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ResourceId for OpaqueId {
    fn encode(&self) -> String {
        self.0.clone()
    }

    fn decode(id: &str) -> Result<Self, IdError> {
        if id.is_empty() {
            Err(IdError::Empty)
        } else {
            Ok(Self(id.to_owned()))
        }
    }
}

/// Join the parts of a composite id.
///
/// Parts are percent-encoded so a part may itself contain the separator.
pub fn join_parts<const N: usize>(parts: [&str; N]) -> String {
    parts
        .iter()
        .map(|part| urlencoding::encode(part))
        .join_with(SEPARATOR)
        .to_string()
}

/// Split a composite id built by [`join_parts`]
pub fn split_parts<const N: usize>(id: &str) -> Result<[String; N], IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }
    let raw = id.split(SEPARATOR).collect::<Vec<_>>();
    if raw.len() != N {
        return Err(IdError::PartCount {
            id: id.to_owned(),
            expected: N,
            found: raw.len(),
        });
    }

    let mut parts: [String; N] = std::array::from_fn(|_| String::new());
    for (index, (part, raw)) in parts.iter_mut().zip(raw).enumerate() {
        *part = urlencoding::decode(raw)
            .map_err(|_| IdError::Encoding {
                id: id.to_owned(),
                index,
            })?
            .into_owned();
    }
    Ok(parts)
}
