/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Console preferences: an optional TOML file, then `AGRIREGISTRY_*`
//! environment overrides, then command-line flags (applied by the CLI).

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs, io};

use log::warn;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const CONFIG_DIR_NAME: &str = "agriregistry";
const CONFIG_FILE_NAME: &str = "console.toml";
const SESSION_FILE_NAME: &str = "session.json";

pub const ENV_CONFIG: &str = "AGRIREGISTRY_CONFIG";
pub const ENV_API_URL: &str = "AGRIREGISTRY_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "AGRIREGISTRY_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "AGRIREGISTRY_SESSION_FILE";
pub const ENV_PERSIST_SESSION: &str = "AGRIREGISTRY_PERSIST_SESSION";
pub const ENV_LOG: &str = "AGRIREGISTRY_LOG";

/// Every variable the console reads; used for the startup snapshot.
pub const ENV_KEYS: [&str; 6] = [
    ENV_CONFIG,
    ENV_API_URL,
    ENV_TIMEOUT_SECS,
    ENV_SESSION_FILE,
    ENV_PERSIST_SESSION,
    ENV_LOG,
];

#[derive(Debug)]
pub enum PrefsError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            },
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            },
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: '{value}'"),
        }
    }
}

impl std::error::Error for PrefsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolePrefs {
    pub api_url: String,
    pub timeout_secs: u64,
    pub session_file: Option<PathBuf>,
    pub persist_session: bool,
    pub log_filter: Option<String>,
}

impl Default for ConsolePrefs {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: None,
            persist_session: true,
            log_filter: None,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(SESSION_FILE_NAME))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ConsolePrefs {
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, PrefsError> {
        toml::from_str(raw).map_err(|source| PrefsError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` if given, else `AGRIREGISTRY_CONFIG`, else the
    /// default location. A missing file is only an error when it was named
    /// explicitly.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PrefsError> {
        let env_path = env::var_os(ENV_CONFIG).map(PathBuf::from);
        let named = explicit.map(Path::to_path_buf).or(env_path);
        let required = named.is_some();
        let mut prefs = match named.or_else(default_config_path) {
            Some(path) => match fs::read_to_string(&path) {
                Ok(raw) => Self::from_toml_str(&raw, &path)?,
                Err(source) if source.kind() == io::ErrorKind::NotFound && !required => {
                    Self::default()
                },
                Err(source) => return Err(PrefsError::Read { path, source }),
            },
            None => Self::default(),
        };
        prefs.apply_env_overrides(|key| env::var(key).ok());
        prefs.validate()?;
        Ok(prefs)
    }

    /// Overlay environment values. Unparseable numbers and flags are
    /// reported and ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!("{ENV_TIMEOUT_SECS} invalid ('{raw}'); keeping {}", self.timeout_secs),
            }
        }
        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            self.session_file = Some(PathBuf::from(path.trim()));
        }
        if let Some(raw) = lookup(ENV_PERSIST_SESSION) {
            match parse_flag(&raw) {
                Some(enabled) => self.persist_session = enabled,
                None => warn!("{ENV_PERSIST_SESSION} invalid ('{raw}'); keeping {}", self.persist_session),
            }
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_filter = Some(filter);
        }
    }

    pub fn validate(&self) -> Result<(), PrefsError> {
        self.api_base()?;
        if self.timeout_secs == 0 {
            return Err(PrefsError::InvalidValue {
                key: "timeout_secs",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn api_base(&self) -> Result<Url, PrefsError> {
        Url::parse(&self.api_url).map_err(|_| PrefsError::InvalidValue {
            key: "api_url",
            value: self.api_url.clone(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Where the session token lives, or `None` when persistence is off.
    pub fn session_path(&self) -> Option<PathBuf> {
        if !self.persist_session {
            return None;
        }
        self.session_file.clone().or_else(default_session_path)
    }
}
