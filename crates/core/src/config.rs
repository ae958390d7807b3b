//! Configuration file and ordered setting lookup.
//!
//! Settings such as the tesseract executable or the language-model API key
//! are resolved through an ordered list of [`SettingSource`]s; the first
//! source with a non-empty value wins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".docextract.toml";

/// Environment variable holding the language-model API key.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Common tesseract install locations, probed in order.
pub const COMMON_TESSERACT_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// On-disk TOML configuration.
/// All fields are optional so partial configs work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub ocr: Option<OcrConfig>,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    pub tesseract_path: Option<String>,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ConfigFile {
    pub fn tesseract_path(&self) -> Option<&str> {
        self.ocr.as_ref()?.tesseract_path.as_deref()
    }

    pub fn dpi(&self) -> Option<u32> {
        self.ocr.as_ref()?.dpi
    }

    pub fn api_key(&self) -> Option<&str> {
        self.llm.as_ref()?.api_key.as_deref()
    }

    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// Write the config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Platform config path: `<config_dir>/docextract/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docextract").join("config.toml"))
}

/// Load config by cascading the CWD file over the platform file.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_FILE));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Ignoring invalid config {}: {}", path.display(), e);
            None
        }
    }
}

/// Merge two configs field by field; `overlay` wins where set.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_ocr = base.ocr.unwrap_or_default();
    let over_ocr = overlay.ocr.unwrap_or_default();
    let base_llm = base.llm.unwrap_or_default();
    let over_llm = overlay.llm.unwrap_or_default();

    ConfigFile {
        ocr: Some(OcrConfig {
            tesseract_path: over_ocr.tesseract_path.or(base_ocr.tesseract_path),
            dpi: over_ocr.dpi.or(base_ocr.dpi),
        }),
        llm: Some(LlmConfig {
            api_key: over_llm.api_key.or(base_llm.api_key),
            model: over_llm.model.or(base_llm.model),
            endpoint: over_llm.endpoint.or(base_llm.endpoint),
            max_tokens: over_llm.max_tokens.or(base_llm.max_tokens),
            temperature: over_llm.temperature.or(base_llm.temperature),
        }),
    }
}

/// A place a setting can come from.
pub trait SettingSource {
    /// Human-readable origin, used in log messages.
    fn describe(&self) -> String;

    /// The value, if this source has one.
    fn value(&self) -> Option<String>;
}

/// A value passed explicitly (e.g. on the command line).
#[derive(Debug, Clone)]
pub struct Explicit(pub Option<String>);

impl SettingSource for Explicit {
    fn describe(&self) -> String {
        "command line".to_string()
    }

    fn value(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A value read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvVar(pub String);

impl SettingSource for EnvVar {
    fn describe(&self) -> String {
        format!("environment variable {}", self.0)
    }

    fn value(&self) -> Option<String> {
        std::env::var(&self.0).ok()
    }
}

/// A value taken from the loaded configuration file.
#[derive(Debug, Clone)]
pub struct FromConfig(pub Option<String>);

impl SettingSource for FromConfig {
    fn describe(&self) -> String {
        "config file".to_string()
    }

    fn value(&self) -> Option<String> {
        self.0.clone()
    }
}

/// The first existing path among a list of candidates.
#[derive(Debug, Clone)]
pub struct ProbePaths(pub Vec<PathBuf>);

impl SettingSource for ProbePaths {
    fn describe(&self) -> String {
        "auto-detection".to_string()
    }

    fn value(&self) -> Option<String> {
        self.0
            .iter()
            .find(|p| p.exists())
            .map(|p| p.to_string_lossy().to_string())
    }
}

/// A resolved setting and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: String,
}

/// Query sources in order, returning the first non-empty value.
pub fn resolve_first(sources: &[&dyn SettingSource]) -> Option<Resolved> {
    sources.iter().find_map(|source| {
        source
            .value()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|value| Resolved {
                value,
                source: source.describe(),
            })
    })
}

/// Resolve the tesseract executable: explicit path, config file, then
/// common install locations.
pub fn resolve_tesseract_path(explicit: Option<&Path>, config: &ConfigFile) -> Option<Resolved> {
    let explicit = Explicit(explicit.map(|p| p.to_string_lossy().to_string()));
    let configured = FromConfig(config.tesseract_path().map(str::to_string));
    let probe = ProbePaths(COMMON_TESSERACT_PATHS.iter().map(PathBuf::from).collect());
    resolve_first(&[&explicit, &configured, &probe])
}

/// Resolve the language-model API key: explicit key, environment
/// variable, then config file.
pub fn resolve_api_key(explicit: Option<&str>, config: &ConfigFile) -> Option<Resolved> {
    let explicit = Explicit(explicit.map(str::to_string));
    let env = EnvVar(API_KEY_ENV_VAR.to_string());
    let configured = FromConfig(config.api_key().map(str::to_string));
    resolve_first(&[&explicit, &env, &configured])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    impl SettingSource for Fixed {
        fn describe(&self) -> String {
            self.0.to_string()
        }

        fn value(&self) -> Option<String> {
            self.1.map(str::to_string)
        }
    }

    #[test]
    fn test_resolve_first_priority() {
        let a = Fixed("a", Some("first"));
        let b = Fixed("b", Some("second"));
        let resolved = resolve_first(&[&a, &b]).unwrap();
        assert_eq!(resolved.value, "first");
        assert_eq!(resolved.source, "a");
    }

    #[test]
    fn test_resolve_first_skips_empty_values() {
        let a = Fixed("a", None);
        let b = Fixed("b", Some("   "));
        let c = Fixed("c", Some(" third "));
        let resolved = resolve_first(&[&a, &b, &c]).unwrap();
        assert_eq!(resolved.value, "third");
        assert_eq!(resolved.source, "c");
    }

    #[test]
    fn test_resolve_first_none() {
        let a = Fixed("a", None);
        assert_eq!(resolve_first(&[&a]), None);
    }

    #[test]
    fn test_env_var_source() {
        std::env::set_var("DOCEXTRACT_TEST_ENV_SOURCE", "from-env");
        let source = EnvVar("DOCEXTRACT_TEST_ENV_SOURCE".to_string());
        assert_eq!(source.value().as_deref(), Some("from-env"));

        let missing = EnvVar("DOCEXTRACT_TEST_ENV_SOURCE_MISSING".to_string());
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_probe_paths_finds_existing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("tesseract");
        std::fs::write(&present, b"").unwrap();

        let probe = ProbePaths(vec![dir.path().join("missing"), present.clone()]);
        assert_eq!(probe.value(), Some(present.to_string_lossy().to_string()));
    }

    #[test]
    fn test_tesseract_explicit_beats_config() {
        let config = ConfigFile {
            ocr: Some(OcrConfig {
                tesseract_path: Some("/from/config".into()),
                dpi: None,
            }),
            llm: None,
        };
        let resolved = resolve_tesseract_path(Some(Path::new("/explicit")), &config).unwrap();
        assert_eq!(resolved.value, "/explicit");

        let resolved = resolve_tesseract_path(None, &config).unwrap();
        assert_eq!(resolved.value, "/from/config");
        assert_eq!(resolved.source, "config file");
    }

    #[test]
    fn test_api_key_explicit_beats_config() {
        let config = ConfigFile {
            ocr: None,
            llm: Some(LlmConfig {
                api_key: Some("sk-config".into()),
                ..LlmConfig::default()
            }),
        };
        let resolved = resolve_api_key(Some("sk-explicit"), &config).unwrap();
        assert_eq!(resolved.value, "sk-explicit");
        assert_eq!(resolved.source, "command line");
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = ConfigFile {
            ocr: Some(OcrConfig {
                tesseract_path: Some("/base/tesseract".into()),
                dpi: Some(200),
            }),
            llm: Some(LlmConfig {
                api_key: Some("sk-base".into()),
                model: Some("base-model".into()),
                ..LlmConfig::default()
            }),
        };
        let overlay = ConfigFile {
            ocr: Some(OcrConfig {
                tesseract_path: None,
                dpi: Some(300),
            }),
            llm: Some(LlmConfig {
                model: Some("overlay-model".into()),
                ..LlmConfig::default()
            }),
        };

        let merged = merge(base, overlay);
        assert_eq!(merged.tesseract_path(), Some("/base/tesseract"));
        assert_eq!(merged.dpi(), Some(300));
        assert_eq!(merged.api_key(), Some("sk-base"));
        assert_eq!(merged.llm().model.as_deref(), Some("overlay-model"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigFile {
            ocr: Some(OcrConfig {
                tesseract_path: Some("/usr/bin/tesseract".into()),
                dpi: None,
            }),
            llm: Some(LlmConfig {
                api_key: Some("sk-test".into()),
                ..LlmConfig::default()
            }),
        };

        config.save(&path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "ocr = [not valid").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
