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
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use tracing::info;

pub mod client;
pub mod credential;
pub mod descriptor;
pub mod error;
pub mod token;

pub use client::{install_crypto_provider, ClientFactory, ClusterClient};
pub use credential::{CredentialResolver, CredentialSet, RoleArn};
pub use descriptor::ClusterDescriptor;
pub use error::{Error, Result};

/// Everything needed to reach one EKS cluster.
#[derive(Clone, Debug)]
pub struct ClusterOptions {
    pub region: String,
    pub cluster_name: String,
    pub role_arn: String,
    /// The role session name, shown in CloudTrail.
    pub session_name: String,
    pub max_attempts: u32,
    pub refresh_skew: Duration,
}

/// Assumes the role, resolves the cluster and connects to its API server.
///
/// Credentials are resolved before the cluster is described, and the cluster
/// is described before the first client is built. Any failure aborts the
/// whole sequence.
pub async fn connect(options: &ClusterOptions) -> Result<ClusterClient> {
    let role_arn = RoleArn::parse(&options.role_arn)?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(options.region.clone()))
        .load()
        .await;

    let credentials =
        Arc::new(CredentialResolver::assume_role(&sdk_config, role_arn, &options.session_name).await);
    let current = credentials.resolve().await?;

    let eks = descriptor::eks_client(&sdk_config, &current, options.max_attempts);
    let cluster = descriptor::describe_cluster(&eks, &options.cluster_name).await?;

    let factory = ClientFactory::new(cluster, &options.region, credentials)?;
    let client = ClusterClient::connect(factory, options.refresh_skew).await?;
    info!("Cluster {} is ready", options.cluster_name);

    Ok(client)
}
