use crate::cli::{ApplyArgs, ServerArgs};
use crate::paths;
use anyhow::{Context, Result, bail};
use reconcile::{DashboardSettings, DesiredState, HostSpec, WebCheck};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zabbix::{AuthMode, Client};

const MASK: &str = "********";

// ============================================================================
// File format
// ============================================================================

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
    pub hosts: Vec<HostSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Frontend URL; `/api_jsonrpc.php` is appended when missing.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Send the token as an Authorization header instead of in the body.
    pub bearer: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: "Admin".to_string(),
            password: String::new(),
            timeout: 10,
            bearer: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub group: String,
    pub base_template: String,
    /// Empty disables the web template.
    pub web_template: String,
    pub web_check: WebCheck,
    pub dashboards: DashboardSettings,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            group: "Monitored Infrastructure".to_string(),
            base_template: "Linux by Zabbix agent".to_string(),
            web_template: "Nginx by Zabbix agent".to_string(),
            web_check: WebCheck::default(),
            dashboards: DashboardSettings::default(),
        }
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct Connection {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub auth_mode: AuthMode,
}

impl Connection {
    /// Build an unauthenticated client for this connection.
    pub fn client(&self) -> Result<Client> {
        let client = Client::new(&self.url, self.timeout)
            .with_context(|| format!("Invalid server URL '{}'", self.url))?;
        Ok(client.with_auth_mode(self.auth_mode))
    }
}

impl Config {
    /// Load the config from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// defaults so that flags and environment variables alone suffice.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let explicit = path.is_some();
        let path = resolve_path(path)?;

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok((Self::default(), path));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok((config, path))
    }

    /// Apply command-line and environment overrides.
    pub fn merge(&mut self, args: &ServerArgs) {
        if let Some(url) = &args.url {
            self.server.url.clone_from(url);
        }
        if let Some(username) = &args.username {
            self.server.username.clone_from(username);
        }
        if let Some(password) = &args.password {
            self.server.password.clone_from(password);
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout = timeout;
        }
        if args.bearer {
            self.server.bearer = true;
        }
    }

    /// Connection settings; the URL is required.
    pub fn connection(&self) -> Result<Connection> {
        if self.server.url.trim().is_empty() {
            bail!("No server URL configured (use --url, ZABBIX_URL or server.url)");
        }
        if self.server.timeout == 0 {
            bail!("Timeout must be at least one second");
        }

        Ok(Connection {
            url: self.server.url.trim().to_string(),
            username: self.server.username.clone(),
            password: self.server.password.clone(),
            timeout: Duration::from_secs(self.server.timeout),
            auth_mode: if self.server.bearer {
                AuthMode::Bearer
            } else {
                AuthMode::Field
            },
        })
    }

    /// Connection settings for commands that log in.
    pub fn credentials_connection(&self) -> Result<Connection> {
        let connection = self.connection()?;
        if connection.password.is_empty() {
            bail!("No password configured (use --password, ZABBIX_PASSWORD or server.password)");
        }
        Ok(connection)
    }

    /// The desired state for `apply`, with its flags folded in.
    pub fn desired_state(&self, args: &ApplyArgs) -> Result<DesiredState> {
        let monitoring = &self.monitoring;

        let mut web_check = monitoring.web_check.clone();
        if let Some(url) = &args.target_url {
            web_check.url.clone_from(url);
        } else if let Some(ip) = args.target_ip {
            web_check.url = format!("http://{ip}/");
        }

        let mut dashboards = monitoring.dashboards.clone();
        if let Some(policy) = args.on_conflict {
            dashboards.on_conflict = policy.into();
        }

        let web_template = Some(monitoring.web_template.trim())
            .filter(|t| !t.is_empty())
            .map(ToString::to_string);

        let desired = DesiredState {
            group: monitoring.group.clone(),
            base_template: monitoring.base_template.clone(),
            web_template,
            hosts: self.hosts.clone(),
            web_check,
            dashboards,
        };

        desired.validate().context("Invalid configuration")?;
        Ok(desired)
    }

    /// The config with the password hidden.
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        if !config.server.password.is_empty() {
            config.server.password = MASK.to_string();
        }
        config
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// The config file to use: the given path expanded, or the default.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(paths::expand(&p.to_string_lossy())),
        None => paths::config_file(),
    }
}

/// Write the sample config to `path`.
pub fn write_sample(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    fs::write(path, SAMPLE).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote sample config to {}", path.display());
    Ok(())
}

/// Sample written by `config init`.
pub const SAMPLE: &str = r#"# zbxsync configuration

[server]
url = "http://zabbix.example.com"
username = "Admin"
# password = "..."   # or set ZABBIX_PASSWORD
timeout = 10

[monitoring]
group = "Monitored Infrastructure"
base_template = "Linux by Zabbix agent"
web_template = "Nginx by Zabbix agent"

[monitoring.web_check]
name = "Website Availability"
# url = "http://203.0.113.10/"   # or pass --target-ip / --target-url
interval = "60s"
expected_status = 200
trigger = "Website is unavailable"

[monitoring.dashboards]
on_conflict = "skip"
overview = "System Overview"
web = "Web Servers"
overview_graph_limit = 4

[[hosts]]
hostname = "bastion.ru-central1.internal"
name = "Bastion Host"
address = "10.0.1.33"

[[hosts]]
hostname = "web1.ru-central1.internal"
name = "Web Server 1"
address = "10.0.10.4"
role = "web"

[[hosts]]
hostname = "web2.ru-central1.internal"
name = "Web Server 2"
address = "10.0.11.5"
role = "web"

[[hosts]]
hostname = "zabbix.ru-central1.internal"
name = "Zabbix Server"
address = "10.0.1.22"

[[hosts]]
hostname = "elastic.ru-central1.internal"
name = "Elasticsearch Server"
address = "10.0.11.19"

[[hosts]]
hostname = "kibana.ru-central1.internal"
name = "Kibana Server"
address = "10.0.1.9"
"#;
