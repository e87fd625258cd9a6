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

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use aws_config::sts::AssumeRoleProvider;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Credentials are re-assumed once they get this close to their expiry.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(5 * 60);

const PROVIDER_NAME: &str = "kubepod-assume-role";

/// An IAM role ARN, e.g. `arn:aws:iam::123456789012:role/eks-reader`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleArn(String);

impl RoleArn {
    pub fn parse(value: &str) -> Result<Self> {
        value.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoleArn {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Authentication(format!("invalid role ARN {value:?}: {reason}"));

        let parts: Vec<&str> = value.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(invalid("expected arn:<partition>:iam::<account>:role/<name>"));
        }
        if !matches!(parts[1], "aws" | "aws-cn" | "aws-us-gov") {
            return Err(invalid("unknown partition"));
        }
        if parts[2] != "iam" || !parts[3].is_empty() {
            return Err(invalid("not an IAM resource"));
        }
        if parts[4].len() != 12 || !parts[4].chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("account id must be 12 digits"));
        }
        match parts[5].strip_prefix("role/") {
            Some(name) if !name.is_empty() && !name.ends_with('/') => Ok(RoleArn(value.to_string())),
            _ => Err(invalid("resource must be role/<name>")),
        }
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A time-bounded credential set obtained by assuming a role.
#[derive(Clone)]
pub struct CredentialSet {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
    pub expiry: Option<SystemTime>,
}

impl CredentialSet {
    /// Returns true when the set is expired or will be within `window` of `now`.
    pub fn needs_refresh(&self, now: SystemTime, window: Duration) -> bool {
        match self.expiry {
            Some(expiry) => now + window >= expiry,
            None => false,
        }
    }

    /// Converts into SDK credentials, for explicit injection into clients and signers.
    pub fn as_credentials(&self) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.expose_secret().clone(),
            self.session_token.as_ref().map(|token| token.expose_secret().clone()),
            self.expiry,
            PROVIDER_NAME,
        )
    }
}

impl From<Credentials> for CredentialSet {
    fn from(credentials: Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: SecretString::new(credentials.secret_access_key().to_string()),
            session_token: credentials.session_token().map(|token| SecretString::new(token.to_string())),
            expiry: credentials.expiry(),
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Exchanges a role ARN for temporary credentials and keeps them fresh.
pub struct CredentialResolver {
    role_arn: RoleArn,
    provider: SharedCredentialsProvider,
    refresh_window: Duration,
    cached: RwLock<Option<CredentialSet>>,
}

impl CredentialResolver {
    /// Assumes `role_arn` on top of the base SDK configuration (default credentials
    /// chain and region), using `session_name` as the role session name.
    pub async fn assume_role(sdk_config: &SdkConfig, role_arn: RoleArn, session_name: &str) -> Self {
        let provider = AssumeRoleProvider::builder(role_arn.as_str())
            .session_name(session_name)
            .configure(sdk_config)
            .build()
            .await;

        Self::with_provider(role_arn, SharedCredentialsProvider::new(provider))
    }

    pub fn with_provider(role_arn: RoleArn, provider: SharedCredentialsProvider) -> Self {
        Self { role_arn, provider, refresh_window: DEFAULT_REFRESH_WINDOW, cached: RwLock::new(None) }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    pub fn role_arn(&self) -> &RoleArn {
        &self.role_arn
    }

    /// Returns the current credential set, assuming the role again when there is
    /// none yet or the cached one is about to expire.
    pub async fn resolve(&self) -> Result<CredentialSet> {
        if let Some(credentials) = self.cached.read().await.as_ref() {
            if !credentials.needs_refresh(SystemTime::now(), self.refresh_window) {
                return Ok(credentials.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(credentials) = cached.as_ref() {
            if !credentials.needs_refresh(SystemTime::now(), self.refresh_window) {
                return Ok(credentials.clone());
            }
        }

        debug!("Assuming role {}", self.role_arn);
        let credentials = self.provider.provide_credentials().await.map_err(|err| {
            Error::Authentication(format!(
                "unable to assume role {}: {}",
                self.role_arn,
                aws_sdk_eks::error::DisplayErrorContext(&err)
            ))
        })?;

        let credentials = CredentialSet::from(credentials);
        info!(
            "Assumed role {} with access key {} (expiry: {:?})",
            self.role_arn, credentials.access_key_id, credentials.expiry
        );

        *cached = Some(credentials.clone());
        Ok(credentials)
    }
}
