/// Configuration file: clusters, users, contexts and client settings.
///
/// ```toml
/// default-context = "prod"
///
/// [clusters.prod]
/// servers = ["https://es-prod:9200"]
///
/// [users.admin]
/// username = "elastic"
/// password = "changeme"
///
/// [contexts.prod]
/// cluster = "prod"
/// user = "admin"
///
/// [settings]
/// no_check_certificate = false
/// timeout = 30
/// ```
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow, bail};
use serde::Deserialize;
use tracing::debug;

use crate::cli::args::ConnectionArgs;
use crate::client::Credentials;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "ESCLI_CONFIG";

/// File name looked up in the home directory.
pub const DEFAULT_FILE_NAME: &str = ".escli.toml";

/// Request timeout when the file does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterDef>,
    #[serde(default)]
    pub users: BTreeMap<String, UserDef>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextDef>,
    #[serde(default, rename = "default-context")]
    pub default_context: Option<String>,
    #[serde(default)]
    pub settings: ConfigSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterDef {
    pub servers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDef {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextDef {
    pub cluster: String,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSettings {
    #[serde(default)]
    pub no_check_certificate: bool,
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

/// Everything needed to build the cluster client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Context name (`custom` and `noauth` for the built-in ones).
    pub context: String,
    pub endpoint: String,
    pub credentials: Option<Credentials>,
    pub verify_certs: bool,
    pub timeout: Duration,
}

impl Config {
    /// Load the configuration file.
    ///
    /// An explicit path (argument, then `ESCLI_CONFIG`) must exist; the
    /// default `~/.escli.toml` may be absent, yielding an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any file fails to parse.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = explicit {
            return Self::from_file(&path);
        }

        match dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME)) {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve which cluster to talk to, and as whom.
    ///
    /// Order: explicit username+password, `--context`, `default-context`,
    /// then an unauthenticated connection to `--elasticsearch`.
    ///
    /// # Errors
    ///
    /// Returns an error if a named context, or the cluster/user it refers to, is not defined.
    pub fn resolve(&self, args: &ConnectionArgs) -> anyhow::Result<Connection> {
        let verify_certs = !(args.no_check_certificate || self.settings.no_check_certificate);
        let timeout = Duration::from_secs(self.settings.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let (context, endpoint, credentials) =
            if let (Some(username), Some(password)) = (&args.username, &args.password) {
                debug!("username and password provided, building custom context");
                let credentials = Credentials {
                    username: username.clone(),
                    password: password.clone(),
                };
                ("custom".to_owned(), args.elasticsearch.clone(), Some(credentials))
            } else if let Some(name) = &args.context {
                debug!(context = %name, "using provided context");
                self.context_connection(name)?
            } else if let Some(name) = &self.default_context {
                debug!(context = %name, "using default context");
                self.context_connection(name)?
            } else {
                debug!("no credentials nor context, building noauth context");
                ("noauth".to_owned(), args.elasticsearch.clone(), None)
            };

        Ok(Connection {
            context,
            endpoint: with_scheme(&endpoint),
            credentials,
            verify_certs,
            timeout,
        })
    }

    fn context_connection(
        &self,
        name: &str,
    ) -> anyhow::Result<(String, String, Option<Credentials>)> {
        let context = self
            .contexts
            .get(name)
            .ok_or_else(|| anyhow!("context '{name}' is not defined"))?;
        let cluster = self.clusters.get(&context.cluster).ok_or_else(|| {
            anyhow!(
                "context '{name}' refers to unknown cluster '{}'",
                context.cluster
            )
        })?;
        let Some(server) = cluster.servers.first() else {
            bail!("cluster '{}' has no servers", context.cluster);
        };

        let credentials = match &context.user {
            None => None,
            Some(user_name) => {
                let user = self.users.get(user_name).ok_or_else(|| {
                    anyhow!("context '{name}' refers to unknown user '{user_name}'")
                })?;
                match (&user.username, &user.password) {
                    (Some(username), Some(password)) => Some(Credentials {
                        username: username.clone(),
                        password: password.clone(),
                    }),
                    _ => None,
                }
            }
        };

        Ok((name.to_owned(), server.clone(), credentials))
    }
}

/// Servers without an explicit scheme are reached over HTTPS.
fn with_scheme(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_owned()
    } else {
        format!("https://{server}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default-context = "prod"

[clusters.prod]
servers = ["es-prod:9200", "es-prod-2:9200"]

[clusters.dev]
servers = ["http://localhost:9200"]

[users.admin]
username = "elastic"
password = "secret"

[contexts.prod]
cluster = "prod"
user = "admin"

[contexts.dev]
cluster = "dev"

[contexts.broken]
cluster = "nowhere"

[settings]
timeout = 5
"#;

    fn args() -> ConnectionArgs {
        ConnectionArgs {
            elasticsearch: "http://localhost:9200".to_owned(),
            username: None,
            password: None,
            context: None,
            no_check_certificate: false,
        }
    }

    #[test]
    fn test_parse() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.default_context.as_deref(), Some("prod"));
        assert_eq!(config.contexts.len(), 3);
        assert_eq!(config.settings.timeout, Some(5));
        assert!(!config.settings.no_check_certificate);
    }

    #[test]
    fn test_default_context_with_scheme_and_user() {
        let config = Config::parse(SAMPLE).unwrap();
        let conn = config.resolve(&args()).unwrap();
        assert_eq!(conn.context, "prod");
        assert_eq!(conn.endpoint, "https://es-prod:9200");
        assert_eq!(conn.credentials.unwrap().username, "elastic");
        assert_eq!(conn.timeout, Duration::from_secs(5));
        assert!(conn.verify_certs);
    }

    #[test]
    fn test_named_context_wins_over_default() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut a = args();
        a.context = Some("dev".to_owned());
        let conn = config.resolve(&a).unwrap();
        assert_eq!(conn.endpoint, "http://localhost:9200");
        assert!(conn.credentials.is_none());
    }

    #[test]
    fn test_explicit_credentials_win() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut a = args();
        a.username = Some("bob".to_owned());
        a.password = Some("pw".to_owned());
        a.context = Some("dev".to_owned());
        a.no_check_certificate = true;
        let conn = config.resolve(&a).unwrap();
        assert_eq!(conn.context, "custom");
        assert_eq!(conn.endpoint, "http://localhost:9200");
        assert!(!conn.verify_certs);
    }

    #[test]
    fn test_noauth_without_config() {
        let conn = Config::default().resolve(&args()).unwrap();
        assert_eq!(conn.context, "noauth");
        assert_eq!(conn.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_unknown_context_is_an_error() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut a = args();
        a.context = Some("staging".to_owned());
        assert!(config.resolve(&a).is_err());
        a.context = Some("broken".to_owned());
        let err = config.resolve(&a).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::parse("clusters = 3").is_err());
    }
}
