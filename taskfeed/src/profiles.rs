//! Connection profiles and display settings: a JSON file mapping profile name -> { url, tls_ca },
//! stored under XDG config dir: $XDG_CONFIG_HOME/taskfeed/profiles.json (fallback ~/.config/taskfeed/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io, path::PathBuf};

use crate::dashboard::Panels;
use crate::feed::DEFAULT_TIME_FORMAT;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    /// chrono format string for activity timestamps
    pub time_format: String,
    pub panels: Panels,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.into(),
            panels: Panels::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("taskfeed")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskfeed")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn default_log_path() -> PathBuf {
    config_dir().join("taskfeed.log")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => match serde_json::from_str(&s) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable profiles file: {e}");
                ProfilesFile::default()
            }
        },
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p).map_err(io::Error::other)?;
    fs::write(path, data)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (not persisted). (url, tls_ca)
    Direct(String, Option<String>),
    /// Loaded from existing profile entry (url, tls_ca)
    Loaded(String, Option<String>),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// No profile could be resolved (e.g., missing arguments)
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub url: Option<String>,
    pub tls_ca: Option<String>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        // Both provided -> direct (maybe later saved by caller)
        if let Some(u) = self.url {
            return ResolveProfile::Direct(u, self.tls_ca);
        }
        // Only profile name given -> try load
        match self.profile_name {
            Some(name) => match pf.profiles.get(&name) {
                Some(entry) => ResolveProfile::Loaded(entry.url.clone(), entry.tls_ca.clone()),
                None => ResolveProfile::PromptCreate(name),
            },
            // Nothing provided -> maybe prompt select if profiles exist
            None if pf.profiles.is_empty() => ResolveProfile::None,
            None => ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect()),
        }
    }
}
