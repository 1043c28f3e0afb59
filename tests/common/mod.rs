use std::path::{Path, PathBuf};
use toml::Table;

/// Write `config` as the update-fs.toml within `dir`, returning its path
#[allow(unused)]
pub fn test_config_file(dir: &Path, config: Table) -> PathBuf {
    let config_path = dir.join("update-fs.toml");
    let config: String = toml::to_string_pretty(&config).unwrap();

    std::fs::write(&config_path, config).unwrap();

    config_path
}

/// Names of every entry within `dir`, sorted
#[allow(unused)]
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut entries: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    entries
}
