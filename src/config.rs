use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::canvas::FontName;
use crate::generation::DEFAULT_ENDPOINT;

const APP_CONFIG_FILE: &str = "config.json";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/guide/`
/// - Linux: `~/.config/guide/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/guide/`
///
/// Falls back to `~/.guide/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("guide"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".guide")
        })
}

/// Load a JSON config file from `dir`, returning Default if missing or corrupt.
/// Logs when the file exists but cannot be read or parsed, so a corrupt file
/// is visible instead of silently resetting settings.
pub fn load_json_config_in<T: DeserializeOwned + Default>(dir: &Path, filename: &str) -> T {
    let path = dir.join(filename);
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Save a JSON config file into `dir` atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_json_config_in<T: Serialize>(dir: &Path, filename: &str, config: &T) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Settings for talking to the generation service and drawing the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    /// Whole-request timeout. Generation runs a local LLM, so this is generous.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_style")]
    pub font_style: String,
    /// Where timestamped previews go when no explicit path is given.
    #[serde(default)]
    pub preview_dir: Option<PathBuf>,
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    180
}

fn default_font_family() -> String {
    FontName::default().family
}

fn default_font_style() -> String {
    FontName::default().style
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            request_timeout_secs: default_request_timeout_secs(),
            font_family: default_font_family(),
            font_style: default_font_style(),
            preview_dir: None,
        }
    }
}

impl AppConfig {
    pub fn font(&self) -> FontName {
        FontName::new(&self.font_family, &self.font_style)
    }

    /// Directory for previews, defaulting to `{config_dir}/previews`.
    pub fn preview_dir(&self) -> PathBuf {
        self.preview_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("previews"))
    }
}

pub fn load_app_config() -> AppConfig {
    load_json_config_in(&config_dir(), APP_CONFIG_FILE)
}

pub fn save_app_config(config: &AppConfig) -> Result<(), String> {
    save_json_config_in(&config_dir(), APP_CONFIG_FILE, config)
}

/// Path of the app config file, for display.
pub fn app_config_path() -> PathBuf {
    config_dir().join(APP_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn app_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig {
            endpoint_url: "https://ui.example.com/preview".to_string(),
            request_timeout_secs: 30,
            font_family: "Roboto".to_string(),
            font_style: "Medium".to_string(),
            preview_dir: Some(PathBuf::from("/tmp/previews")),
        };

        save_json_config_in(dir.path(), "config.json", &cfg).unwrap();
        let loaded: AppConfig = load_json_config_in(dir.path(), "config.json");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(AppConfig::default()).unwrap();
        assert_eq!(json["endpointUrl"], "http://localhost:8000/preview");
        assert_eq!(json["requestTimeoutSecs"], 180);
        assert_eq!(json["fontFamily"], "Inter");
    }

    #[test]
    fn serde_default_for_missing_fields() {
        let cfg: AppConfig = serde_json::from_str(r#"{"fontFamily":"Roboto"}"#).unwrap();
        assert_eq!(cfg.font_family, "Roboto");
        assert_eq!(cfg.font_style, "Regular");
        assert_eq!(cfg.endpoint_url, DEFAULT_ENDPOINT);
        assert_eq!(cfg.request_timeout_secs, 180);
        assert!(cfg.preview_dir.is_none());
    }

    #[test]
    fn missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let cfg: AppConfig = load_json_config_in(dir.path(), "nonexistent.json");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn corrupt_file_returns_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "not valid json!!!").unwrap();
        let cfg: AppConfig = load_json_config_in(dir.path(), "bad.json");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        save_json_config_in(dir.path(), "config.json", &AppConfig::default()).unwrap();
        save_json_config_in(dir.path(), "config.json", &AppConfig::default()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["config.json".to_string()]);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        save_json_config_in(&nested, "config.json", &AppConfig::default()).unwrap();
        assert!(nested.join("config.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        save_json_config_in(dir.path(), "config.json", &AppConfig::default()).unwrap();

        let mode = fs::metadata(dir.path().join("config.json"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "Config file should be owner-only (0600)");
    }

    #[test]
    fn font_from_config() {
        let cfg = AppConfig {
            font_family: "Roboto".to_string(),
            font_style: "Bold".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(cfg.font(), FontName::new("Roboto", "Bold"));
    }

    #[test]
    fn explicit_preview_dir_wins() {
        let cfg = AppConfig {
            preview_dir: Some(PathBuf::from("/srv/previews")),
            ..AppConfig::default()
        };
        assert_eq!(cfg.preview_dir(), PathBuf::from("/srv/previews"));
        assert!(AppConfig::default().preview_dir().ends_with("previews"));
    }
}
