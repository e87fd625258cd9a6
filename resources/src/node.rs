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

use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::error::{Error, Result};
use super::NodeList;

/// Lists every node of the cluster, as returned by the API server.
pub async fn list(client: &Client) -> Result<NodeList> {
    let api: Api<Node> = Api::all(client.clone());
    let nodes = api.list(&ListParams::default()).await.map_err(Error::KubeError)?;

    for node in nodes.iter() {
        info!("node: {}", node.name_any());
    }

    Ok(NodeList { items: nodes.items, metadata: nodes.metadata })
}

pub async fn get(client: &Client, name: &str) -> Result<Node> {
    let api: Api<Node> = Api::all(client.clone());
    let node = api.get(name).await.map_err(|err| Error::from_kube("node", name, err))?;

    info!("node: {}", node.name_any());
    Ok(node)
}
