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

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::{CommandFactory, FromArgMatches};
use serde_yaml::Value;
use tracing::level_filters::LevelFilter;
use validator::Validate;

/// The configuration parameters for the application.
///
/// These can either be passed on the command line, pulled from environment
/// variables, or read from a configuration file. Command line flags win over
/// environment variables, which win over the file. Environment variable names
/// are the configuration keys with dots replaced by underscores, e.g.
/// `eks.cluster.name` becomes `EKS_CLUSTER_NAME`.
///
/// For development convenience, these can also be read from a `.env` file in the working
/// directory where the application is started.
///
/// See `.env.sample` in the repository root for details.
#[derive(Clone, Debug, clap::Parser, Validate)]
#[command(name = "kubepod", version, about = "Read-only HTTP API over the nodes and pods of an EKS cluster")]
pub struct Config {
    /// The directory searched for the configuration file.
    #[arg(long, env = "CONFIG_SOURCE", default_value = "deploy/")]
    pub config_source: PathBuf,

    /// The configuration file, as a path or as a name inside the config source.
    /// The `.yaml`, `.yml` and `.json` extensions may be omitted.
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Identifier for the application, also used as the role session name.
    #[arg(long, env = "APP_ID", default_value = "kubepod")]
    #[validate(length(min = 2, max = 64))]
    pub app_id: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// The address to serve requests on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// The port to serve requests on.
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// The AWS region of the cluster.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    #[validate(length(min = 1))]
    pub aws_region: String,

    /// The name of the EKS cluster.
    #[arg(long, env = "EKS_CLUSTER_NAME", default_value = "")]
    #[validate(length(min = 1, message = "the EKS cluster name must be set"))]
    pub eks_cluster_name: String,

    /// The ARN of the role assumed to access the cluster.
    #[arg(long, env = "AWS_ARN", default_value = "")]
    #[validate(length(min = 1, message = "the ARN of the role to assume must be set"))]
    pub aws_arn: String,

    /// Maximum attempts for AWS calls, including the first one.
    #[arg(long, env = "AWS_MAX_ATTEMPTS", default_value = "3")]
    #[validate(range(min = 1, max = 10))]
    pub aws_max_attempts: u32,

    /// Deadline in seconds for each call to the cluster API.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    #[validate(range(min = 1))]
    pub request_timeout: u64,

    /// How many seconds before its token expires the cluster client is rebuilt.
    /// Must stay well below the 14 minute token lifetime.
    #[arg(long, env = "TOKEN_REFRESH_SKEW", default_value = "60")]
    #[validate(range(max = 780))]
    pub token_refresh_skew: u64,

    /// Answer 404 instead of 500 when the requested node or pod does not exist.
    #[arg(long, env = "NOT_FOUND_STATUS")]
    pub not_found_status: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Loads the configuration from the process arguments, environment and
    /// configuration file. Exits with a usage message on invalid arguments.
    pub fn load() -> anyhow::Result<Self> {
        match Self::load_from(std::env::args_os()) {
            Err(err) => match err.downcast::<clap::Error>() {
                Ok(err) => err.exit(),
                Err(err) => Err(err),
            },
            config => config,
        }
    }

    pub fn load_from<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut command = Config::command();

        if let Some(path) = config_file(&args)? {
            for (id, value) in read_file(&path)? {
                if command.get_arguments().any(|arg| arg.get_id() == id.as_str()) {
                    command = command.mut_arg(id, |arg| arg.default_value(value));
                }
            }
        }

        let matches = command.try_get_matches_from(args)?;
        let config = Config::from_arg_matches(&matches)?;
        config.validate()?;

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn token_refresh_skew(&self) -> Duration {
        Duration::from_secs(self.token_refresh_skew)
    }
}

/// Finds the configuration file named by `--config-file`/`CONFIG_FILE`, if any.
fn config_file(args: &[OsString]) -> anyhow::Result<Option<PathBuf>> {
    let Ok(matches) = Config::command().ignore_errors(true).try_get_matches_from(args) else {
        return Ok(None);
    };
    let Some(file) = matches.get_one::<PathBuf>("config_file") else {
        return Ok(None);
    };
    let source = matches.get_one::<PathBuf>("config_source").cloned().unwrap_or_default();

    locate(&source, file).map(Some)
}

fn locate(source: &Path, file: &Path) -> anyhow::Result<PathBuf> {
    let base = if file.is_absolute() || file.exists() { file.to_path_buf() } else { source.join(file) };

    let mut candidates = vec![base.clone()];
    for extension in ["yaml", "yml", "json"] {
        let mut name = base.clone().into_os_string();
        name.push(".");
        name.push(extension);
        candidates.push(PathBuf::from(name));
    }

    match candidates.into_iter().find(|candidate| candidate.is_file()) {
        Some(path) => Ok(path),
        None => bail!("configuration file {} not found in {}", file.display(), source.display()),
    }
}

/// Reads a YAML (or JSON) file into `(argument id, value)` pairs: nested keys
/// are joined with dots, then dots and dashes become underscores.
fn read_file(path: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("cannot read configuration {}", path.display()))?;
    let document: Value =
        serde_yaml::from_str(&contents).with_context(|| format!("cannot parse configuration {}", path.display()))?;

    let mut entries = vec![];
    flatten("", &document, &mut entries);

    Ok(entries.into_iter().map(|(key, value)| (key.replace(['.', '-'], "_"), value)).collect())
}

fn flatten(prefix: &str, value: &Value, entries: &mut Vec<(String, String)>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let Some(key) = scalar(key) else { continue };
                let key = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
                flatten(&key, value, entries);
            }
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, entries),
        value => {
            if let Some(value) = scalar(value) {
                entries.push((prefix.to_string(), value));
            }
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const ROLE: &str = "arn:aws:iam::123456789012:role/eks-reader";

    fn write_config(contents: &str, extension: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "kubepod-config-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("kubepod.{extension}"));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_flags() {
        let config = Config::load_from([
            "kubepod",
            "--eks-cluster-name",
            "ddi-dev-use1",
            "--aws-arn",
            ROLE,
            "--port",
            "9000",
            "--not-found-status",
        ])
        .unwrap();

        assert_eq!(config.eks_cluster_name, "ddi-dev-use1");
        assert_eq!(config.aws_arn, ROLE);
        assert_eq!(config.port, 9000);
        assert_eq!(config.app_id, "kubepod");
        assert_eq!(config.log_level, LevelFilter::INFO);
        assert!(config.not_found_status);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_cluster_name_is_required() {
        let err = Config::load_from(["kubepod", "--aws-arn", ROLE]).unwrap_err();
        assert!(err.to_string().contains("cluster name"));
    }

    #[test]
    fn test_refresh_skew_must_leave_token_lifetime() {
        let args = ["kubepod", "--eks-cluster-name", "dev", "--aws-arn", ROLE, "--token-refresh-skew"];

        let config = Config::load_from(args.iter().copied().chain(["780"])).unwrap();
        assert_eq!(config.token_refresh_skew(), Duration::from_secs(780));

        let err = Config::load_from(args.iter().copied().chain(["840"])).unwrap_err();
        assert!(err.to_string().contains("token_refresh_skew"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::load_from(["kubepod", "--eks-cluster-name", "dev", "--aws-arn", ROLE, "--port", "http"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_file_values_are_defaults() {
        let path = write_config(
            "log-level: debug\nport: 9090\naws:\n  region: eu-west-1\n  arn: arn:aws:iam::123456789012:role/eks-reader\neks:\n  cluster:\n    name: ddi-prod-euw1\nunknown:\n  key: ignored\n",
            "yaml",
        );

        let config = Config::load_from([
            "kubepod".into(),
            OsString::from("--config-file"),
            path.clone().into_os_string(),
            OsString::from("--port"),
            OsString::from("7070"),
        ])
        .unwrap();

        assert_eq!(config.eks_cluster_name, "ddi-prod-euw1");
        assert_eq!(config.aws_arn, ROLE);
        assert_eq!(config.log_level, LevelFilter::DEBUG);
        // Flags win over the file.
        assert_eq!(config.port, 7070);
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_file_is_searched_in_config_source_without_extension() {
        let path = write_config("{\"eks\": {\"cluster\": {\"name\": \"from-json\"}}, \"aws\": {\"arn\": \"arn:aws:iam::123456789012:role/eks-reader\"}}", "json");
        let dir = path.parent().unwrap();

        let config = Config::load_from([
            OsString::from("kubepod"),
            OsString::from("--config-source"),
            dir.as_os_str().to_owned(),
            OsString::from("--config-file"),
            OsString::from("kubepod"),
        ])
        .unwrap();

        assert_eq!(config.eks_cluster_name, "from-json");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load_from(["kubepod", "--config-file", "/nonexistent/kubepod-config"]).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_flatten_nested_keys() {
        let document: Value = serde_yaml::from_str("app:\n  id: kp\nlog-level: warn\nlist: [1, 2]\n").unwrap();
        let mut entries = vec![];
        flatten("", &document, &mut entries);

        assert_eq!(entries, vec![("app.id".to_string(), "kp".to_string()), ("log-level".to_string(), "warn".to_string())]);
    }
}
