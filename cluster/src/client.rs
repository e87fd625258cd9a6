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

use std::io::BufReader;
use std::sync::{Arc, Once};
use std::time::{Duration, SystemTime};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kube::Client;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential::CredentialResolver;
use crate::descriptor::ClusterDescriptor;
use crate::error::{Error, Result};
use crate::token::generate_token;

static INIT_CRYPTO: Once = Once::new();

/// Clients are rebuilt this long before their bearer token expires.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(60);

/// Installs aws-lc-rs as the process-wide rustls crypto provider.
///
/// Both the `ring` and `aws-lc-rs` providers are linked in (kube and the AWS
/// SDK each enable one), so rustls cannot choose a default by itself. Must run
/// before the first client is built; later calls do nothing.
pub fn install_crypto_provider() {
    INIT_CRYPTO.call_once(|| {
        // Fails only when a provider is already installed.
        if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
            debug!("A rustls crypto provider was already installed");
        }
    });
}

/// Decodes the base64 encoded PEM bundle returned by EKS into DER certificates.
pub fn decode_certificate_authority(data: &str) -> Result<Vec<Vec<u8>>> {
    let pem = STANDARD
        .decode(data.trim())
        .map_err(|err| Error::InvalidCertificate(format!("certificate authority is not valid base64: {err}")))?;

    let mut reader = BufReader::new(pem.as_slice());
    let mut certs = vec![];
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|err| Error::InvalidCertificate(format!("malformed PEM: {err}")))?;
        certs.push(cert.as_ref().to_vec());
    }

    if certs.is_empty() {
        return Err(Error::InvalidCertificate("no certificate found in certificate authority data".into()));
    }

    Ok(certs)
}

/// Builds Kubernetes clients for one cluster, each with a freshly minted token.
pub struct ClientFactory {
    descriptor: ClusterDescriptor,
    region: String,
    credentials: Arc<CredentialResolver>,
    root_certs: Vec<Vec<u8>>,
}

impl ClientFactory {
    pub fn new(descriptor: ClusterDescriptor, region: &str, credentials: Arc<CredentialResolver>) -> Result<Self> {
        let root_certs = decode_certificate_authority(&descriptor.certificate_authority)?;
        install_crypto_provider();
        Ok(Self { descriptor, region: region.to_string(), credentials, root_certs })
    }

    pub fn descriptor(&self) -> &ClusterDescriptor {
        &self.descriptor
    }

    /// Returns a new client together with the moment its token expires.
    pub async fn build(&self) -> Result<(Client, SystemTime)> {
        let credentials = self.credentials.resolve().await?;
        let token = generate_token(
            &credentials.as_credentials(),
            &self.region,
            &self.descriptor.name,
            SystemTime::now(),
        )?;

        let cluster_url: http::Uri = self.descriptor.endpoint.parse().map_err(|err| {
            Error::ClientConstruction(format!("invalid cluster endpoint {}: {}", self.descriptor.endpoint, err))
        })?;

        let mut config = kube::Config::new(cluster_url);
        config.root_cert = Some(self.root_certs.clone());
        config.auth_info.token = Some(SecretString::new(token.token));

        let client = Client::try_from(config).map_err(|err| Error::ClientConstruction(err.to_string()))?;
        debug!("Created client for cluster {} (token expires at {:?})", self.descriptor.name, token.expires_at);

        Ok((client, token.expires_at))
    }
}

struct CachedClient {
    client: Client,
    expires_at: SystemTime,
}

/// A shared handle to the cluster's API client that swaps in a new client
/// before the current token expires, or after [`ClusterClient::invalidate`].
pub struct ClusterClient {
    factory: ClientFactory,
    refresh_skew: Duration,
    current: RwLock<Option<CachedClient>>,
}

impl ClusterClient {
    /// Builds the first client eagerly so that construction failures surface at startup.
    pub async fn connect(factory: ClientFactory, refresh_skew: Duration) -> Result<Self> {
        let (client, expires_at) = factory.build().await?;
        info!("Connected to cluster {} at {}", factory.descriptor.name, factory.descriptor.endpoint);

        Ok(Self { factory, refresh_skew, current: RwLock::new(Some(CachedClient { client, expires_at })) })
    }

    pub fn descriptor(&self) -> &ClusterDescriptor {
        self.factory.descriptor()
    }

    pub async fn client(&self) -> Result<Client> {
        if let Some(cached) = self.current.read().await.as_ref() {
            if self.is_fresh(cached) {
                return Ok(cached.client.clone());
            }
        }

        let mut current = self.current.write().await;
        if let Some(cached) = current.as_ref() {
            if self.is_fresh(cached) {
                return Ok(cached.client.clone());
            }
        }

        info!("Refreshing bearer token for cluster {}", self.factory.descriptor.name);
        let (client, expires_at) = self.factory.build().await?;
        *current = Some(CachedClient { client: client.clone(), expires_at });

        Ok(client)
    }

    /// Drops the current client, e.g. after the API server rejected its token.
    pub async fn invalidate(&self) {
        self.current.write().await.take();
    }

    fn is_fresh(&self, cached: &CachedClient) -> bool {
        SystemTime::now() + self.refresh_skew < cached.expires_at
    }
}
