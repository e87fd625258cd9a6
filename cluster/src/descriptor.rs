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

use aws_config::SdkConfig;
use aws_sdk_eks::config::retry::RetryConfig;
use aws_sdk_eks::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_eks::operation::describe_cluster::DescribeClusterError;
use aws_sdk_eks::types::Cluster;
use aws_sdk_eks::Client;
use tracing::{error, info};

use crate::credential::CredentialSet;
use crate::error::{Error, Result};

/// Connection details of an EKS cluster, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterDescriptor {
    pub name: String,
    /// The API server endpoint, e.g. `https://ABCD.gr7.us-east-1.eks.amazonaws.com`.
    pub endpoint: String,
    /// The base64 encoded PEM bundle of the cluster certificate authority.
    pub certificate_authority: String,
}

impl ClusterDescriptor {
    /// Builds a descriptor from a `DescribeCluster` response, requiring both a
    /// non-empty endpoint and non-empty CA data.
    pub fn from_cluster(requested: &str, cluster: &Cluster) -> Result<Self> {
        let endpoint = cluster
            .endpoint()
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| Error::ClusterResolution(format!("cluster {requested} has no endpoint yet")))?;

        let certificate_authority = cluster
            .certificate_authority()
            .and_then(|ca| ca.data())
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                Error::ClusterResolution(format!("cluster {requested} has no certificate authority data"))
            })?;

        Ok(Self {
            name: cluster.name().unwrap_or(requested).to_string(),
            endpoint: endpoint.to_string(),
            certificate_authority: certificate_authority.to_string(),
        })
    }
}

/// Creates an EKS client bound to the given credentials.
///
/// The client uses the SDK's standard retry strategy, which retries transient
/// failures (timeouts, throttling, 5xx) with jittered exponential backoff up
/// to `max_attempts` attempts.
pub fn eks_client(sdk_config: &SdkConfig, credentials: &CredentialSet, max_attempts: u32) -> Client {
    let config = aws_sdk_eks::config::Builder::from(sdk_config)
        .credentials_provider(credentials.as_credentials())
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts.max(1)))
        .build();

    Client::from_conf(config)
}

/// Describes the cluster to get its endpoint and certificate authority.
pub async fn describe_cluster(client: &Client, name: &str) -> Result<ClusterDescriptor> {
    info!("Describing EKS cluster {}", name);

    let response = client.describe_cluster().name(name).send().await.map_err(|err| {
        let err = classify(name, err);
        error!("Unable to describe cluster {}: {}", name, err);
        err
    })?;

    let cluster = response
        .cluster()
        .ok_or_else(|| Error::ClusterResolution(format!("empty DescribeCluster response for {name}")))?;

    let descriptor = ClusterDescriptor::from_cluster(name, cluster)?;
    info!("Resolved cluster {} at {}", descriptor.name, descriptor.endpoint);

    Ok(descriptor)
}

fn classify(name: &str, err: SdkError<DescribeClusterError>) -> Error {
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => Error::TransientService(message),
        SdkError::ServiceError(service) => {
            let inner = service.err();
            if inner.is_resource_not_found_exception() {
                Error::ClusterNotFound(name.to_string())
            } else if inner.is_server_exception()
                || inner.is_service_unavailable_exception()
                || inner.code() == Some("ThrottlingException")
                || service.raw().status().is_server_error()
            {
                Error::TransientService(message)
            } else {
                Error::ClusterResolution(message)
            }
        }
        _ => Error::ClusterResolution(message),
    }
}
