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

/// Error returned by an IBM Cloud service call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("IAM authentication failed: {0}")]
    Auth(String),
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Build a status error out of an IBM Cloud error body.
    ///
    /// The platform APIs are not consistent in how they report errors:
    /// VPC uses `{"errors": [{"message": ..}]}`, Functions `{"error": ..}`
    /// and Satellite Link `{"message": ..}`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                if let Some(errors) = json.get("errors").and_then(|e| e.as_array()) {
                    let messages = errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                        .collect::<Vec<_>>();
                    if !messages.is_empty() {
                        return Some(messages.join("; "));
                    }
                }
                ["message", "error", "description"]
                    .iter()
                    .find_map(|key| json.get(*key).and_then(|m| m.as_str()))
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        Self::status(status, message)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Error raised while building or reaching the client session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the IBM Cloud provider has not been configured")]
    NotConfigured,
    #[error("`ibmcloud_api_key` or `iam_token` must be set to use the {0} service")]
    MissingCredentials(&'static str),
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
    #[error("could not build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
