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

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::conns::ApiError;
use crate::utils::DisplayJoinable;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_MIN_TIMEOUT: Duration = Duration::from_secs(10);

/// State reported by refresh functions once the object is gone
pub const DONE: &str = "done";

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timeout after {timeout:?} while waiting for state to become `{target}` (last state: `{last_state}`)")]
    Timeout {
        target: String,
        last_state: String,
        timeout: Duration,
    },
    #[error("unexpected state `{state}`, wanted target `{target}`")]
    UnexpectedState { state: String, target: String },
    #[error(transparent)]
    Refresh(#[from] ApiError),
}

/// Polls a refresh function until it reports one of the `target` states
pub struct StateChangeConf<'s, F> {
    pub pending: &'s [&'s str],
    pub target: &'s [&'s str],
    pub refresh: F,
    pub timeout: Duration,
    pub delay: Duration,
    pub min_timeout: Duration,
}

impl<'s, F> StateChangeConf<'s, F> {
    pub fn new(pending: &'s [&'s str], target: &'s [&'s str], refresh: F, timeout: Duration) -> Self {
        Self {
            pending,
            target,
            refresh,
            timeout,
            delay: DEFAULT_DELAY,
            min_timeout: DEFAULT_MIN_TIMEOUT,
        }
    }

    /// Wait for the state to reach a target.
    ///
    /// The refresh function returns the refreshed object, if any, and its state.
    pub async fn wait_for_state<T, Fut>(mut self) -> Result<Option<T>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(Option<T>, String), ApiError>>,
    {
        let targets = self.target;
        let target = || targets.iter().join_with("|").to_string();
        let start = Instant::now();
        sleep(self.delay).await;

        loop {
            let (object, state) = (self.refresh)().await?;
            debug!(%state, "refreshed state");

            if targets.contains(&state.as_str()) {
                return Ok(object);
            }
            if !self.pending.contains(&state.as_str()) {
                return Err(WaitError::UnexpectedState {
                    state,
                    target: target(),
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(WaitError::Timeout {
                    target: target(),
                    last_state: state,
                    timeout: self.timeout,
                });
            }
            sleep(self.min_timeout.min(self.timeout - elapsed)).await;
        }
    }
}
