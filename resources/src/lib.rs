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

use std::future::Future;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::Client;
use kubepod_cluster::{ClusterClient, ClusterDescriptor};
use tracing::{debug, error, warn};

use self::error::{Error, Result};

pub mod error;
pub mod node;
pub mod pod;

/// Node collection as returned by the API server (`kind: NodeList`).
pub type NodeList = k8s_openapi::List<Node>;
/// Pod collection as returned by the API server (`kind: PodList`).
pub type PodList = k8s_openapi::List<Pod>;

/// Read access to the nodes and pods of one cluster.
#[async_trait]
pub trait Accessor: Send + Sync {
    async fn list_nodes(&self) -> Result<NodeList>;

    async fn get_node(&self, name: &str) -> Result<Node>;

    /// Lists the pods of `namespace`, or of all namespaces when it is `None`.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<PodList>;

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod>;
}

/// Where an accessor gets its API client from.
#[async_trait]
pub trait ClientSource: Send + Sync {
    async fn client(&self) -> Result<Client>;

    /// Forgets the current client so that the next call builds one with a new token.
    async fn invalidate(&self);

    fn descriptor(&self) -> &ClusterDescriptor;
}

#[async_trait]
impl ClientSource for ClusterClient {
    async fn client(&self) -> Result<Client> {
        ClusterClient::client(self).await.map_err(Error::ClusterError)
    }

    async fn invalidate(&self) {
        ClusterClient::invalidate(self).await
    }

    fn descriptor(&self) -> &ClusterDescriptor {
        ClusterClient::descriptor(self)
    }
}

/// An [`Accessor`] backed by the Kubernetes API server.
pub struct KubeAccessor<S = ClusterClient> {
    source: S,
}

impl<S: ClientSource> KubeAccessor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Runs `op` with the current client. When the API server answers 401 the
    /// client is rebuilt with a new token and `op` runs once more.
    async fn call<T, F, Fut>(&self, action: &str, op: F) -> Result<T>
    where
        F: Fn(Client) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let client = self.source.client().await?;
        let result = match op(client).await {
            Err(err) if err.is_unauthorized() => {
                warn!("The API server of {} rejected our token, refreshing it", self.source.descriptor().name);
                self.source.invalidate().await;
                let client = self.source.client().await?;
                op(client).await
            }
            result => result,
        };

        if let Err(err) = &result {
            let cluster = self.source.descriptor();
            debug!(cluster = %cluster.name, endpoint = %cluster.endpoint, "error {} with kube client", action);
            error!("Unable to {}: {}", action, err);
        }

        result
    }
}

#[async_trait]
impl<S: ClientSource> Accessor for KubeAccessor<S> {
    async fn list_nodes(&self) -> Result<NodeList> {
        self.call("list nodes", |client| async move { node::list(&client).await }).await
    }

    async fn get_node(&self, name: &str) -> Result<Node> {
        self.call("get node", |client| async move { node::get(&client, name).await }).await
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<PodList> {
        self.call("list pods", |client| async move { pod::list(&client, namespace).await }).await
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod> {
        self.call("get pod", |client| async move { pod::get(&client, name, namespace).await }).await
    }
}
