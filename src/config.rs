use std::{
    env::current_dir,
    path::{Path, PathBuf},
};

use eyre::Context;
use serde::Deserialize;

use crate::fs::FileSystem;

/// Configuration structure for update-fs.toml
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Config {
    /// Modes used when creating files and directories
    pub permissions: PermissionsConfig,
    /// Staged install behavior
    pub install: InstallConfig,
}

/// Permission modes (unix only, ignored on other platforms)
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Mode for manifest files. Installed payloads keep the 0600 mode of
    /// their staging file
    pub file_mode: u32,
    /// Mode for directories created by update-fs
    pub dir_mode: u32,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            file_mode: 0o644,
            dir_mode: 0o755,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    /// Name pattern for the staging file created next to the destination,
    /// the last `*` is replaced with a random string
    pub temp_pattern: String,

    /// Status code to exit with once an install succeeds, lets a
    /// supervisor know an update has been staged
    pub exit_code: Option<i32>,

    /// Path relative to the config file to write an install manifest to
    pub manifest: Option<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            temp_pattern: ".staged-*".to_string(),
            exit_code: None,
            manifest: None,
        }
    }
}

/// Name for the config file
const CONFIG_FILE_NAME: &str = "update-fs.toml";

/// Searches for the nearest configuration file, checks the current
/// directory then parent directories one by one. Returns [None] when
/// no directory has a config file
pub fn discover_nearest_config_file() -> eyre::Result<Option<PathBuf>> {
    let path: PathBuf = current_dir().context("failed to determine current directory")?;
    discover_config_file_from(&path)
}

/// Config discovery starting at `start`
fn discover_config_file_from(start: &Path) -> eyre::Result<Option<PathBuf>> {
    for path in start.ancestors() {
        let config_path = path.join(CONFIG_FILE_NAME);

        if config_path.is_dir() {
            eyre::bail!("expected update-fs.toml to be a file but got a directory");
        }

        if config_path.exists() {
            return Ok(Some(config_path));
        }
    }

    Ok(None)
}

/// Parse a config file from bytes of the TOML file
fn parse_config_file(file: &[u8]) -> eyre::Result<Config> {
    toml::from_slice(file).context("failed to parse config file")
}

/// Read a TOML config file from the provided `path`
pub fn read_config_file<Fs: FileSystem>(fs: &Fs, path: &Path) -> eyre::Result<Config> {
    let mut file = fs.open(path).context("failed to read config file")?;
    let value = fs.read_all(&mut file)?;
    parse_config_file(&value)
}

#[cfg(test)]
mod test {
    use super::{
        CONFIG_FILE_NAME, InstallConfig, PermissionsConfig, discover_config_file_from,
        parse_config_file, read_config_file,
    };
    use crate::fs::{Handle, MockFileSystem};
    use std::{
        io::Cursor,
        path::{Path, PathBuf},
    };

    /// An empty file falls back to every default
    #[test]
    fn test_parse_empty_config() {
        let config = parse_config_file(b"").unwrap();

        assert_eq!(config.permissions, PermissionsConfig::default());
        assert_eq!(config.install, InstallConfig::default());
        assert_eq!(config.permissions.file_mode, 0o644);
        assert_eq!(config.permissions.dir_mode, 0o755);
    }

    /// Octal TOML literals are accepted for modes
    #[test]
    fn test_parse_octal_modes() {
        let config = parse_config_file(
            br#"
            [permissions]
            file_mode = 0o600

            [install]
            temp_pattern = "agent-*.tmp"
            exit_code = 42
            manifest = "desired-image"
            "#,
        )
        .unwrap();

        assert_eq!(config.permissions.file_mode, 0o600);
        assert_eq!(config.permissions.dir_mode, 0o755);
        assert_eq!(config.install.temp_pattern, "agent-*.tmp");
        assert_eq!(config.install.exit_code, Some(42));
        assert_eq!(
            config.install.manifest,
            Some(PathBuf::from("desired-image"))
        );
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(parse_config_file(b"[permissions]\nfile_mode = \"rw\"").is_err());
    }

    /// The config file is read through the file system abstraction
    #[test]
    fn test_read_config_file_uses_fs() {
        let mut fs = MockFileSystem::new();

        fs.expect_open()
            .withf(|path| path.ends_with("update-fs.toml"))
            .times(1)
            .returning(|_| {
                let handle: Handle = Box::new(Cursor::new(b"[install]\nexit_code = 3".to_vec()));
                Ok(handle)
            });

        fs.expect_read_all().times(1).returning(|src| {
            let mut bytes = Vec::new();
            src.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let config = read_config_file(&fs, Path::new("/etc/update-fs.toml")).unwrap();
        assert_eq!(config.install.exit_code, Some(3));
    }

    /// Discovery walks up through parent directories
    #[test]
    fn test_discover_parent_config() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(CONFIG_FILE_NAME), b"").unwrap();

        let found = discover_config_file_from(&nested).unwrap();
        assert_eq!(found, Some(root.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_discover_config_directory_rejected() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(CONFIG_FILE_NAME)).unwrap();

        assert!(discover_config_file_from(root.path()).is_err());
    }
}
