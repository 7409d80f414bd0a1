//! Run configuration: config file, precedence resolution, seed list.
//!
//! Everything is resolved once at startup into plain structs that the
//! pipeline receives by reference; there is no ambient global state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::fetch::FetchMode;

/// Hardcoded fallbacks, used when neither CLI, environment nor config
/// file provide a value.
const DEFAULT_SITES_FILE: &str = "sites.txt";
const DEFAULT_OUT_DIR: &str = "output";
const DEFAULT_FIRST_N: usize = 50;

/// `config.yaml` model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(default)]
    pub defaults: FileDefaults,
}

/// One entry under `sites:`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    pub host: String,
    #[serde(default)]
    pub include_paths: Vec<String>,
}

/// The `defaults:` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDefaults {
    #[serde(default)]
    pub sites_file: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub first_n: Option<usize>,
    #[serde(default)]
    pub dynamic: Option<String>,
}

impl FileConfig {
    /// Load from `path`. A missing file is an empty config; a malformed
    /// one is a startup error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Per-host include-path rules, keyed by normalized hostname.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    by_host: HashMap<String, Vec<String>>,
}

impl SiteConfig {
    pub fn from_entries(entries: &[SiteEntry]) -> Self {
        let mut by_host = HashMap::new();
        for entry in entries {
            let host = normalize_host(&entry.host);
            if !host.is_empty() {
                by_host.insert(host, entry.include_paths.clone());
            }
        }
        Self { by_host }
    }

    /// Include paths for a URL's host. Unknown hosts get no filter.
    pub fn include_paths_for(&self, url: &str) -> &[String] {
        match host_of(url).and_then(|host| self.by_host.get(&host)) {
            Some(paths) => paths.as_slice(),
            None => &[],
        }
    }
}

/// Lowercase a hostname and strip a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let lowered = host.trim().to_lowercase();
    lowered.strip_prefix("www.").unwrap_or(&lowered).to_string()
}

/// Normalized hostname of a URL.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(normalize_host)
}

/// Values supplied on the command line or through the environment
/// (clap merges those two, flag winning over variable).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sites_file: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub first_n: Option<usize>,
    pub dynamic: Option<String>,
    pub static_only: bool,
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sites_file: PathBuf,
    pub out_dir: PathBuf,
    /// Max products per site.
    pub first_n: usize,
    pub mode: FetchMode,
}

impl RunConfig {
    /// Merge overrides with file defaults and hardcoded fallbacks.
    /// Precedence: CLI > environment > config file > hardcoded.
    pub fn resolve(overrides: &Overrides, defaults: &FileDefaults) -> Self {
        let sites_file = overrides
            .sites_file
            .clone()
            .or_else(|| defaults.sites_file.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SITES_FILE));
        let out_dir = overrides
            .out_dir
            .clone()
            .or_else(|| defaults.out_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let first_n = overrides
            .first_n
            .or(defaults.first_n)
            .unwrap_or(DEFAULT_FIRST_N);
        let mode = resolve_mode(
            overrides.static_only,
            overrides.dynamic.as_deref(),
            defaults.dynamic.as_deref(),
        );
        Self {
            sites_file,
            out_dir,
            first_n,
            mode,
        }
    }
}

/// `--static-only` forces static; otherwise `always` means rendered and
/// anything else falls back to auto.
fn resolve_mode(static_only: bool, flag: Option<&str>, file_default: Option<&str>) -> FetchMode {
    if static_only {
        return FetchMode::Static;
    }
    let choice = flag.or(file_default).unwrap_or("auto");
    if choice.eq_ignore_ascii_case("always") {
        FetchMode::Rendered
    } else {
        FetchMode::AutoWithFallback
    }
}

/// Read the seed list: one URL per line, blank lines and `#` comments
/// skipped.
pub fn load_sites(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sites file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Shop.Example"), "shop.example");
        assert_eq!(normalize_host(" shop.example "), "shop.example");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.shop.example/cat").as_deref(),
            Some("shop.example")
        );
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn test_include_paths_unknown_host_empty() {
        let sites = SiteConfig::from_entries(&[SiteEntry {
            host: "www.shop.example".to_string(),
            include_paths: vec!["/shop".to_string()],
        }]);
        assert_eq!(
            sites.include_paths_for("https://shop.example/x"),
            ["/shop".to_string()]
        );
        assert!(sites.include_paths_for("https://other.example/x").is_empty());
    }

    #[test]
    fn test_resolve_precedence() {
        let defaults = FileDefaults {
            sites_file: Some("from_file.txt".to_string()),
            out_dir: None,
            first_n: Some(10),
            dynamic: Some("always".to_string()),
        };
        let overrides = Overrides {
            sites_file: Some(PathBuf::from("from_cli.txt")),
            first_n: None,
            ..Default::default()
        };
        let run = RunConfig::resolve(&overrides, &defaults);
        assert_eq!(run.sites_file, PathBuf::from("from_cli.txt"));
        assert_eq!(run.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert_eq!(run.first_n, 10);
        assert_eq!(run.mode, FetchMode::Rendered);
    }

    #[test]
    fn test_resolve_hardcoded_fallbacks() {
        let run = RunConfig::resolve(&Overrides::default(), &FileDefaults::default());
        assert_eq!(run.sites_file, PathBuf::from(DEFAULT_SITES_FILE));
        assert_eq!(run.first_n, DEFAULT_FIRST_N);
        assert_eq!(run.mode, FetchMode::AutoWithFallback);
    }

    #[test]
    fn test_static_only_overrides_dynamic() {
        let mode = resolve_mode(true, Some("always"), None);
        assert_eq!(mode, FetchMode::Static);
    }

    #[test]
    fn test_load_sites_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# header comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://a.example/cat").unwrap();
        writeln!(file, "  https://b.example/cat  ").unwrap();
        let sites = load_sites(file.path()).unwrap();
        assert_eq!(sites, ["https://a.example/cat", "https://b.example/cat"]);
    }

    #[test]
    fn test_file_config_missing_is_empty() {
        let config = FileConfig::load(Path::new("/nonexistent/config.yaml")).unwrap();
        assert!(config.sites.is_empty());
        assert!(config.defaults.first_n.is_none());
    }

    #[test]
    fn test_file_config_parses_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "sites:\n  - host: www.shop.example\n    include_paths: [\"/shop\"]\ndefaults:\n  first_n: 5\n  dynamic: always\n"
        )
        .unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.defaults.first_n, Some(5));
        assert_eq!(config.defaults.dynamic.as_deref(), Some("always"));
    }
}
