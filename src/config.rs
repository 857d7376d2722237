// File: ./src/config.rs
// Loads the destination server credentials.
use crate::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub allow_insecure_certs: bool,
    /// Calendar home collection path; skips principal discovery when set.
    #[serde(default)]
    pub calendar_home: Option<String>,
}

impl Credentials {
    /// Reads a credentials file. `.toml` files are parsed as TOML, everything
    /// else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let creds: Credentials = if is_toml {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        };

        if creds.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                path: path.to_path_buf(),
                field: "url",
            });
        }
        Ok(creds)
    }

    /// `<config dir>/credentials.toml` for this tool.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("com", "bc2t", "bc2t-migrate")
            .map(|proj| proj.config_dir().join(DEFAULT_CREDENTIALS_FILE))
            .ok_or(ConfigError::NoDefaultPath)
    }

    /// The explicit path if given, the default location otherwise.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::default_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "creds.json",
            r#"{"url": "https://dav.example.com/", "username": "me", "password": "pw"}"#,
        );
        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.url, "https://dav.example.com/");
        assert_eq!(creds.username, "me");
        assert!(!creds.allow_insecure_certs);
        assert_eq!(creds.calendar_home, None);
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "creds.toml",
            "url = \"https://dav.example.com/\"\nusername = \"me\"\npassword = \"pw\"\nallow_insecure_certs = true\ncalendar_home = \"/calendars/me/\"\n",
        );
        let creds = Credentials::load(&path).unwrap();
        assert!(creds.allow_insecure_certs);
        assert_eq!(creds.calendar_home.as_deref(), Some("/calendars/me/"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_bad_syntax_and_empty_url() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_file(&dir, "bad.json", "{url:");
        assert!(matches!(
            Credentials::load(&bad),
            Err(ConfigError::Parse { .. })
        ));

        let empty = write_file(
            &dir,
            "empty.json",
            r#"{"url": " ", "username": "me", "password": "pw"}"#,
        );
        assert!(matches!(
            Credentials::load(&empty),
            Err(ConfigError::MissingField { field: "url", .. })
        ));
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let p = Path::new("/tmp/creds.json");
        assert_eq!(Credentials::resolve_path(Some(p)).unwrap(), p);
    }
}
