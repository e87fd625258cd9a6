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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("AuthenticationError: {0}")]
    Authentication(String),

    #[error("ClusterNotFoundError: cluster {0} does not exist")]
    ClusterNotFound(String),

    #[error("TransientServiceError: {0}")]
    TransientService(String),

    #[error("ClusterResolutionError: {0}")]
    ClusterResolution(String),

    #[error("TokenGenerationError: {0}")]
    TokenGeneration(String),

    #[error("InvalidCertificateError: {0}")]
    InvalidCertificate(String),

    #[error("ClientConstructionError: {0}")]
    ClientConstruction(String),
}

impl Error {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientService(_))
    }

    /// Whether this error happened while resolving the cluster descriptor.
    pub fn is_cluster_resolution(&self) -> bool {
        matches!(
            self,
            Error::ClusterNotFound(_) | Error::TransientService(_) | Error::ClusterResolution(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
