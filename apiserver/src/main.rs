// Copyright 2024 The Kubepod Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use kubepod::app;
use kubepod::config::{Config, LogFormat};
use kubepod::context::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // This returns an error if the `.env` file doesn't exist, but that's not what we want
    // since we're not going to use a `.env` file if we deploy this application.
    dotenv::dotenv().ok();

    // Parse our configuration from the command line, environment and configuration file.
    // This will exit with a help message if something is wrong.
    let config = Config::load()?;

    init_tracing(&config);
    debug!("Configuration: {:#?}", config);

    kubepod_cluster::install_crypto_provider();

    // Initialize the cluster client and application context. Nothing is served
    // unless the cluster is reachable with the configured role.
    let ctx = Arc::new(Context::new(config).await?);

    app::run(ctx).await
}

/// `RUST_LOG` directives, when present, take precedence over the configured level.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::builder().with_default_directive(config.log_level.into()).from_env_lossy();

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
