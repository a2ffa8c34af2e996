//! User configuration read from `config.toml`.
//!
//! ```toml
//! root = "/home/me/go/src"
//! depth_limit = 4
//! log_level = "debug"
//! ```

use crate::error::{Error, Result};
use crate::types::DepthLimit;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "wscd";
const CONFIG_FILE_NAME: &str = "config.toml";
const INDEX_FILE_NAME: &str = "index.bin";
const HISTORY_DIR_NAME: &str = "history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: Option<PathBuf>,
    /// `-1` walks without limit
    pub depth_limit: i64,
    pub index_file: Option<PathBuf>,
    pub history_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            depth_limit: DepthLimit::Unlimited.as_raw(),
            index_file: None,
            history_dir: None,
            log_file: None,
            log_level: None,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

fn cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(Error::CacheDirMissing)
}

impl Config {
    /// Reads `path`, or the default config location when `None`.
    ///
    /// A missing file yields the defaults, a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(Error::ConfigRead { path, source }),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn depth_limit(&self) -> Result<DepthLimit> {
        DepthLimit::from_raw(self.depth_limit)
    }

    pub fn index_file(&self) -> Result<PathBuf> {
        match &self.index_file {
            Some(file) => Ok(file.clone()),
            None => Ok(cache_dir()?.join(INDEX_FILE_NAME)),
        }
    }

    pub fn history_dir(&self) -> Result<PathBuf> {
        match &self.history_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(cache_dir()?.join(HISTORY_DIR_NAME)),
        }
    }

    /// Workspace root: `cli_root` (flag or env), then the config file, then
    /// `$GOPATH/src`, then `~/go/src`.
    pub fn resolve_root(&self, cli_root: Option<&Path>) -> Result<PathBuf> {
        let gopath = std::env::var_os("GOPATH").filter(|value| !value.is_empty());
        self.resolve_root_with(cli_root, gopath.as_deref().map(Path::new), dirs::home_dir())
    }

    fn resolve_root_with(
        &self,
        cli_root: Option<&Path>,
        gopath: Option<&Path>,
        home: Option<PathBuf>,
    ) -> Result<PathBuf> {
        if let Some(root) = cli_root {
            return Ok(root.to_path_buf());
        }
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        if let Some(gopath) = gopath {
            // only the first entry of a GOPATH list is used
            let first = std::env::split_paths(gopath).next();
            if let Some(first) = first.filter(|path| !path.as_os_str().is_empty()) {
                return Ok(first.join("src"));
            }
        }

        home.map(|home| home.join("go").join("src"))
            .ok_or(Error::RootMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_partial_config_with_defaults() {
        let config = Config::parse(
            r#"
            root = "/ws"
            depth_limit = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.root, Some(PathBuf::from("/ws")));
        assert_eq!(config.depth_limit().unwrap(), DepthLimit::Levels(3));
        assert_eq!(config.index_file, None);
        assert_eq!(config.log_level, None);

        let empty = Config::parse("").unwrap();
        assert_eq!(empty, Config::default());
        assert_eq!(empty.depth_limit().unwrap(), DepthLimit::Unlimited);
    }

    #[test]
    fn rejects_malformed_config_and_depth() {
        assert!(matches!(
            Config::parse("depth_limit = \"deep\""),
            Err(Error::ConfigParse(_))
        ));

        let config = Config::parse("depth_limit = -4").unwrap();
        assert!(matches!(
            config.depth_limit(),
            Err(Error::InvalidDepthLimit(-4))
        ));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(Some(&tmp.path().join("missing.toml"))).unwrap();
        assert_eq!(config, Config::default());

        let file = tmp.path().join("config.toml");
        std::fs::write(&file, "log_level = \"debug\"\n").unwrap();
        let config = Config::load(Some(&file)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn explicit_paths_override_cache_defaults() {
        let config = Config {
            index_file: Some(PathBuf::from("/tmp/idx.bin")),
            history_dir: Some(PathBuf::from("/tmp/hist")),
            ..Config::default()
        };
        assert_eq!(config.index_file().unwrap(), PathBuf::from("/tmp/idx.bin"));
        assert_eq!(config.history_dir().unwrap(), PathBuf::from("/tmp/hist"));
    }

    #[test]
    fn root_resolution_precedence() {
        let home = Some(PathBuf::from("/home/me"));
        let configured = Config {
            root: Some(PathBuf::from("/configured")),
            ..Config::default()
        };
        let unconfigured = Config::default();

        assert_eq!(
            configured
                .resolve_root_with(Some(Path::new("/cli")), Some(Path::new("/gopath")), home.clone())
                .unwrap(),
            PathBuf::from("/cli")
        );
        assert_eq!(
            configured
                .resolve_root_with(None, Some(Path::new("/gopath")), home.clone())
                .unwrap(),
            PathBuf::from("/configured")
        );
        assert_eq!(
            unconfigured
                .resolve_root_with(None, Some(Path::new("/gopath")), home.clone())
                .unwrap(),
            PathBuf::from("/gopath/src")
        );
        assert_eq!(
            unconfigured.resolve_root_with(None, None, home).unwrap(),
            PathBuf::from("/home/me/go/src")
        );
        assert!(matches!(
            unconfigured.resolve_root_with(None, None, None),
            Err(Error::RootMissing)
        ));
    }
}
