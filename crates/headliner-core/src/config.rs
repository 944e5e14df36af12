use lettre::message::Mailbox;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keepalive: KeepAliveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A credential that never shows up in logs or `Debug` output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    #[serde(default)]
    pub url: Option<Secret>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default)]
    pub name: String,
    /// Table holding the scraped headlines
    #[serde(default = "default_news_table")]
    pub table: String,
    /// Sites reported under the "General" category
    #[serde(default = "default_general_sites")]
    pub general_sites: Vec<String>,
    /// Sites reported under the "Sports" category
    #[serde(default = "default_sports_sites")]
    pub sports_sites: Vec<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: default_db_port(),
            user: String::new(),
            password: Secret::default(),
            name: String::new(),
            table: default_news_table(),
            general_sites: default_general_sites(),
            sports_sites: default_sports_sites(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Connection URL for the news store, with credentials percent-encoded
    pub fn connection_url(&self) -> crate::Result<String> {
        if let Some(ref url) = self.url {
            return Ok(url.expose().to_string());
        }

        let host = self
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| crate::Error::Config("database host is not set".to_string()))?;

        let mut url = Url::parse(&format!("mysql://{}:{}", host, self.port))?;
        url.set_path(&self.name);
        if !self.user.is_empty() {
            url.set_username(&self.user)
                .map_err(|_| crate::Error::Config("invalid database user".to_string()))?;
        }
        if !self.password.is_empty() {
            url.set_password(Some(self.password.expose()))
                .map_err(|_| crate::Error::Config("invalid database password".to_string()))?;
        }

        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: Secret,
    /// From address; defaults to the SMTP user
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            user: String::new(),
            password: Secret::default(),
            sender: None,
            recipients: Vec::new(),
            timeout_secs: default_smtp_timeout(),
        }
    }
}

impl SmtpConfig {
    pub fn sender_address(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.user)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// How often the scheduler checks the wall clock
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Run the digest once immediately at startup
    #[serde(default = "default_true")]
    pub run_on_start: bool,
    /// Mail the error text when fetching fails (otherwise skip the send)
    #[serde(default = "default_true")]
    pub send_on_fetch_error: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            run_on_start: default_true(),
            send_on_fetch_error: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepAliveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Externally reachable base URL of this service; defaults to the
    /// local listen port
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_keepalive_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: None,
            interval_secs: default_keepalive_interval(),
            timeout_secs: default_keepalive_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_db_port() -> u16 {
    3306
}

fn default_news_table() -> String {
    "news_updates".to_string()
}

fn default_general_sites() -> Vec<String> {
    ["ynet", "arutz7", "walla", "keshet12", "reshet13", "channel14"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_sports_sites() -> Vec<String> {
    ["sport5", "sport1", "one"].iter().map(|s| s.to_string()).collect()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    60
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    10000
}

fn default_keepalive_interval() -> u64 {
    300
}

fn default_keepalive_timeout() -> u64 {
    10
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} has an invalid value: {:?}", name, value)))
}

/// Split a comma-separated recipient list, dropping blanks
pub fn parse_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// Load configuration from an explicit file, the default file, and the
    /// process environment, in that order of increasing precedence
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Override fields from environment variables. `lookup` returns the
    /// value of a variable if it is set.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(Secret::new(v));
        }
        if let Some(v) = lookup("MYSQL_HOST") {
            self.database.host = Some(v);
        }
        if let Some(v) = lookup("MYSQL_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("MYSQL_PASSWORD") {
            self.database.password = Secret::new(v);
        }
        if let Some(v) = lookup("MYSQL_DATABASE") {
            self.database.name = v;
        }
        if let Some(v) = lookup("MYSQL_PORT") {
            self.database.port = parse_env("MYSQL_PORT", &v)?;
        }

        if let Some(v) = lookup("SMTP_SERVER") {
            self.smtp.server = v;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            self.smtp.port = parse_env("SMTP_PORT", &v)?;
        }
        if let Some(v) = lookup("SMTP_USER") {
            self.smtp.user = v;
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.smtp.password = Secret::new(v);
        }
        if let Some(v) = lookup("EMAIL_RECIPIENTS") {
            self.smtp.recipients = parse_recipients(&v);
        }

        if let Some(v) = lookup("RENDER_EXTERNAL_URL") {
            self.keepalive.base_url = Some(v);
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }

        Ok(())
    }

    /// Check that everything needed for a digest run is present
    pub fn validate(&self) -> crate::Result<()> {
        self.database.connection_url()?;
        if !crate::storage::is_valid_table_name(&self.database.table) {
            return Err(crate::Error::Config(format!(
                "invalid table name: {}",
                self.database.table
            )));
        }

        if self.database.general_sites.is_empty() || self.database.sports_sites.is_empty() {
            return Err(crate::Error::Config(
                "both general_sites and sports_sites need at least one site".to_string(),
            ));
        }
        let general: HashSet<&str> = self.database.general_sites.iter().map(String::as_str).collect();
        if general.contains("") || self.database.sports_sites.iter().any(|s| s.is_empty()) {
            return Err(crate::Error::Config("site identifiers must not be empty".to_string()));
        }
        if let Some(dup) = self.database.sports_sites.iter().find(|s| general.contains(s.as_str())) {
            return Err(crate::Error::Config(format!(
                "site '{}' is listed as both general and sports",
                dup
            )));
        }

        if self.smtp.user.is_empty() || self.smtp.password.is_empty() {
            return Err(crate::Error::Config("SMTP user and password are required".to_string()));
        }
        if self.smtp.recipients.is_empty() {
            return Err(crate::Error::Config("no email recipients configured".to_string()));
        }
        for address in std::iter::once(self.smtp.sender_address())
            .chain(self.smtp.recipients.iter().map(String::as_str))
        {
            address.parse::<Mailbox>().map_err(|e| {
                crate::Error::Config(format!("invalid email address '{}': {}", address, e))
            })?;
        }

        if self.schedule.poll_interval_secs == 0 {
            return Err(crate::Error::Config("poll_interval_secs must be positive".to_string()));
        }
        if self.keepalive.enabled {
            Url::parse(&self.keepalive_base_url())?;
        }

        Ok(())
    }

    /// Base URL the keep-alive loop pings: the configured public URL, or
    /// this process on its own listen port
    pub fn keepalive_base_url(&self) -> String {
        match self.keepalive.base_url {
            Some(ref url) if !url.is_empty() => url.clone(),
            _ => format!("http://localhost:{}", self.server.port),
        }
    }

    /// Human-readable summary with credentials masked
    pub fn summary(&self) -> String {
        let db_target = match (&self.database.url, &self.database.host) {
            (Some(_), _) => "<DATABASE_URL>".to_string(),
            (None, Some(host)) => format!("{}:{}/{}", host, self.database.port, self.database.name),
            (None, None) => "<unset>".to_string(),
        };

        format!(
            "database: {} (table {})\n\
             general sites: {}\n\
             sports sites: {}\n\
             smtp: {}:{} as {} (password {:?})\n\
             recipients: {}\n\
             poll interval: {}s, run on start: {}, send on fetch error: {}\n\
             listen: {}:{}\n\
             keepalive: {} every {}s (enabled: {})",
            db_target,
            self.database.table,
            self.database.general_sites.join(", "),
            self.database.sports_sites.join(", "),
            self.smtp.server,
            self.smtp.port,
            self.smtp.user,
            self.smtp.password,
            self.smtp.recipients.join(", "),
            self.schedule.poll_interval_secs,
            self.schedule.run_on_start,
            self.schedule.send_on_fetch_error,
            self.server.host,
            self.server.port,
            self.keepalive_base_url(),
            self.keepalive.interval_secs,
            self.keepalive.enabled,
        )
    }

    /// Get the configuration file path
    /// Always uses ~/.config/headliner/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("headliner")
            .join("config.toml")
    }
}
