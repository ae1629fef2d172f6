use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrgIdError, Result};

mod env;

const ENV_INSTITUTIONS_PATH: &str = "ORGID_INSTITUTIONS_PATH";
const ENV_GAZETTEER_PATH: &str = "ORGID_GAZETTEER_PATH";
const ENV_GOLD_STANDARD_URL: &str = "ORGID_GOLD_STANDARD_URL";
const ENV_OPENALEX_API_KEY: &str = "ORGID_OPENALEX_API_KEY";
const ENV_CONTACT_EMAIL: &str = "ORGID_CONTACT_EMAIL";
const ENV_HTTP_TIMEOUT_MS: &str = "ORGID_HTTP_TIMEOUT_MS";
const ENV_HOST: &str = "ORGID_HOST";
const ENV_PORT: &str = "ORGID_PORT";

const DEFAULT_INSTITUTIONS_PATH: &str = "ror_with_openalex.csv";
const DEFAULT_GOLD_STANDARD_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vR_sVx4ts9ndZJ6UP8mPqKd-Rw_v-_A_ShaIvgIE4QhmdPeNb5H7GUPZIBZiMEXvLax1iAChlH6Mk6W/pub?output=csv";
const DEFAULT_CONTACT_EMAIL: &str = "info@ourresearch.org";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8787;

/// Runtime configuration. Layers, lowest first: built-in defaults, an
/// optional TOML file, `ORGID_*` environment variables. Binaries apply their
/// own flags on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub institutions_path: PathBuf,
    pub gazetteer_path: Option<PathBuf>,
    pub gold_standard: GoldStandardConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoldStandardConfig {
    pub url: String,
    pub openalex_api_key: Option<String>,
    pub contact_email: String,
    pub http_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            institutions_path: PathBuf::from(DEFAULT_INSTITUTIONS_PATH),
            gazetteer_path: None,
            gold_standard: GoldStandardConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for GoldStandardConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GOLD_STANDARD_URL.to_string(),
            openalex_api_key: None,
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(env::read_env)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            OrgIdError::Validation(format!("cannot read config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Defaults, then the file at `path` when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides(env::read_env))
    }

    /// Overlay every `ORGID_*` variable that `lookup` reports as set and non-blank.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env::non_empty(lookup(ENV_INSTITUTIONS_PATH)) {
            self.institutions_path = PathBuf::from(path);
        }
        if let Some(path) = env::non_empty(lookup(ENV_GAZETTEER_PATH)) {
            self.gazetteer_path = Some(PathBuf::from(path));
        }
        if let Some(url) = env::non_empty(lookup(ENV_GOLD_STANDARD_URL)) {
            self.gold_standard.url = url;
        }
        if let Some(key) = env::non_empty(lookup(ENV_OPENALEX_API_KEY)) {
            self.gold_standard.openalex_api_key = Some(key);
        }
        if let Some(email) = env::non_empty(lookup(ENV_CONTACT_EMAIL)) {
            self.gold_standard.contact_email = email;
        }
        if let Some(timeout) = env::parse_u64_min(lookup(ENV_HTTP_TIMEOUT_MS), 1) {
            self.gold_standard.http_timeout_ms = timeout;
        }
        if let Some(host) = env::non_empty(lookup(ENV_HOST)) {
            self.server.host = host;
        }
        if let Some(port) = env::parse_u16(lookup(ENV_PORT)) {
            self.server.port = port;
        }
        self
    }
}
