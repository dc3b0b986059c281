use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::Config;

pub const CONFIG_FILE_NAME: &str = "shelf.toml";
pub const CONFIG_ENV: &str = "SHELF_CONFIG";
pub const API_URL_ENV: &str = "SHELF_API_URL";

/// Error type for config file handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not parse {path}: {source}")]
    EditParseError {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
}

/// Where the config file is looked for: an explicit path, `$SHELF_CONFIG`,
/// then `./shelf.toml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load the config at `path`. A missing file gives the defaults; a file that
/// exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file reads
/// as an empty document.
pub fn read_config(path: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc: toml_edit::DocumentMut = text.parse().map_err(|e| ConfigError::EditParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
/// The file is replaced atomically.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Update the backend url in the config document
pub fn set_backend_url(doc: &mut toml_edit::DocumentMut, url: &str) {
    if !doc.contains_key("backend") {
        doc["backend"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["backend"]["url"] = toml_edit::value(url);
}

/// Apply `$SHELF_API_URL`, then an explicit `--api-url`, on top of the file
pub fn apply_overrides(config: &mut Config, env_url: Option<String>, cli_url: Option<&str>) {
    if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
        config.backend.url = url;
    }
    if let Some(url) = cli_url {
        config.backend.url = url.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r##"# local dev server
[backend]
url = "http://localhost:8000/api/v1"
timeout_secs = 5

[tree]
include_empty = false

[ui]
colors = { highlight = "#FB4196" }
"##
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("shelf.toml")).unwrap();
        assert_eq!(config.backend.url, "http://localhost:8000/api/v1");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.tree.include_empty);
    }

    #[test]
    fn test_load_sample() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shelf.toml");
        fs::write(&path, sample_config()).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.backend.timeout_secs, 5);
        assert!(!config.tree.include_empty);
        assert!(config.ui.show_key_hints);
        assert_eq!(
            config.ui.colors.get("highlight").map(String::as_str),
            Some("#FB4196")
        );
        assert_eq!(config.log.file, None);
    }

    #[test]
    fn test_parse_error_names_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shelf.toml");
        fs::write(&path, "[backend\nurl = 1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("shelf.toml"));
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shelf.toml");
        fs::write(&path, sample_config()).unwrap();

        let (_config, doc) = read_config(&path).unwrap();
        write_config(&path, &doc).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), sample_config());
    }

    #[test]
    fn test_set_backend_url_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_backend_url(&mut doc, "https://parts.example.com/api/v1");
        let result = doc.to_string();
        assert!(result.contains("# local dev server"));
        assert!(result.contains("url = \"https://parts.example.com/api/v1\""));
        let config: Config = toml::from_str(&result).unwrap();
        assert_eq!(config.backend.timeout_secs, 5);
    }

    #[test]
    fn test_set_backend_url_on_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("new.toml");
        let (_config, mut doc) = read_config(&path).unwrap();
        set_backend_url(&mut doc, "http://10.0.0.2:8000/api/v1");
        write_config(&path, &doc).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.backend.url, "http://10.0.0.2:8000/api/v1");
    }

    #[test]
    fn test_overrides_order() {
        let mut config = Config::default();
        apply_overrides(&mut config, Some("http://env".into()), None);
        assert_eq!(config.backend.url, "http://env");
        apply_overrides(&mut config, Some("http://env".into()), Some("http://flag"));
        assert_eq!(config.backend.url, "http://flag");
        let mut config = Config::default();
        apply_overrides(&mut config, Some("  ".into()), None);
        assert_eq!(config.backend.url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/shelf/custom.toml")));
        assert_eq!(path, PathBuf::from("/etc/shelf/custom.toml"));
    }
}
