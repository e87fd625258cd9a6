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

use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::error::{Error, Result};
use super::PodList;

/// Lists the pods of `namespace`, or of all namespaces when it is `None`.
pub async fn list(client: &Client, namespace: Option<&str>) -> Result<PodList> {
    let api: Api<Pod> = match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };
    let pods = api.list(&ListParams::default()).await.map_err(Error::KubeError)?;

    for pod in pods.iter() {
        info!("pod: {}", pod.name_any());
    }

    Ok(PodList { items: pods.items, metadata: pods.metadata })
}

pub async fn get(client: &Client, name: &str, namespace: &str) -> Result<Pod> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod = api.get(name).await.map_err(|err| Error::from_kube("pod", &format!("{namespace}/{name}"), err))?;

    info!("pod: {}", pod.name_any());
    Ok(pod)
}
