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


use tracing_subscriber::EnvFilter;

use crate::ibm_provider::IbmProvider;

mod conns;
mod flex;
mod functions;
mod ibm_provider;
mod identifier;
mod lifecycle;
mod satellite;
mod timeouts;
mod utils;
mod vpc;
mod wait;

/// Variable holding the log filter of the provider
const LOG_ENV: &str = "TF_LOG_PROVIDER_IBM";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the plugin handshake
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tf_provider::serve("ibm", IbmProvider::default()).await
}
