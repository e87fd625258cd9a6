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

use kubepod_cluster::ClusterOptions;
use kubepod_resources::{Accessor, KubeAccessor};

use crate::config::Config;

#[derive(Clone)]
pub struct Context {
    pub config: Config,
    pub accessor: Arc<dyn Accessor>,
}

impl Context {
    /// Assumes the configured role, discovers the cluster and builds the
    /// first Kubernetes client. Fails without serving anything if any step does.
    pub async fn new(config: Config) -> anyhow::Result<Context> {
        let options = ClusterOptions {
            region: config.aws_region.clone(),
            cluster_name: config.eks_cluster_name.clone(),
            role_arn: config.aws_arn.clone(),
            session_name: config.app_id.clone(),
            max_attempts: config.aws_max_attempts,
            refresh_skew: config.token_refresh_skew(),
        };

        let cluster = kubepod_cluster::connect(&options).await?;

        Ok(Context::with_accessor(config, Arc::new(KubeAccessor::new(cluster))))
    }

    pub fn with_accessor(config: Config, accessor: Arc<dyn Accessor>) -> Context {
        Context { config, accessor }
    }
}
