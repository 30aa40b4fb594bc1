//! Saved control profiles (`*.ccconf`): JSON objects mapping control names to their attributes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use app_dirs::{AppDataType, AppInfo};
use tracing::info;

use crate::control::Controls;
use crate::{Error, Result};

pub const EXTENSION: &str = "ccconf";

pub const APP_INFO: AppInfo = AppInfo {
    name: "cam_control",
    author: "camctl",
};

/// `$XDG_CONFIG_HOME/cam_control`, created if missing.
pub fn config_dir() -> Result<PathBuf> {
    Ok(app_dirs::app_root(AppDataType::UserConfig, &APP_INFO)?)
}

/// The file for profile `name` inside `dir`.
///
/// The name must stay inside `dir`: empty names, names with path separators and names
/// starting with a dot are refused.
pub fn profile_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(Error::ProfileName(name.to_owned()));
    }

    Ok(with_extension(&dir.join(name)))
}

/// Appends `.ccconf` unless the path already carries it.
pub fn with_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == EXTENSION => path.to_owned(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// Write the controls, returning the path actually written.
pub fn save(path: &Path, controls: &Controls) -> Result<PathBuf> {
    let path = with_extension(path);
    let json = serde_json::to_string_pretty(controls).map_err(|source| Error::Settings {
        path: path.clone(),
        source,
    })?;

    fs::write(&path, json)?;
    info!("saved {} controls to {}", controls.len(), path.display());
    Ok(path)
}

pub fn load(path: &Path) -> Result<Controls> {
    let text = fs::read_to_string(path)?;
    let controls = serde_json::from_str(&text).map_err(|source| Error::Settings {
        path: path.to_owned(),
        source,
    })?;

    info!("loaded {}", path.display());
    Ok(controls)
}

/// The profiles in `dir`, sorted by file name.
pub fn list_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(ref err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };

    let mut profiles = vec![];
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == EXTENSION) {
            profiles.push(path);
        }
    }

    profiles.sort();
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_list;

    const LISTING: &str = "
                     brightness 0x00980900 (int)    : min=-64 max=64 step=1 default=0 value=-3
        white_balance_automatic 0x0098090c (bool)   : default=1 value=0
      white_balance_temperature 0x0098091a (int)    : min=2800 max=6500 step=1 default=4600 value=5100
";

    #[test]
    fn extension() {
        assert_eq!(with_extension(Path::new("/tmp/desk")), Path::new("/tmp/desk.ccconf"));
        assert_eq!(
            with_extension(Path::new("/tmp/desk.ccconf")),
            Path::new("/tmp/desk.ccconf")
        );
        assert_eq!(
            with_extension(Path::new("/tmp/desk.json")),
            Path::new("/tmp/desk.json.ccconf")
        );
    }

    #[test]
    fn profile_names() {
        let dir = Path::new("/tmp/profiles");
        assert_eq!(
            profile_path(dir, " evening ").unwrap(),
            Path::new("/tmp/profiles/evening.ccconf")
        );
        assert_eq!(
            profile_path(dir, "desk.ccconf").unwrap(),
            Path::new("/tmp/profiles/desk.ccconf")
        );

        for name in ["", "   ", ".", "..", ".hidden", "../evil", "a/b", "/etc/passwd", "a\\b"] {
            assert!(
                matches!(profile_path(dir, name), Err(Error::ProfileName(_))),
                "{:?} accepted",
                name
            );
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let controls = parse_list(LISTING);

        let path = save(&dir.path().join("evening"), &controls).unwrap();
        assert_eq!(path, dir.path().join("evening.ccconf"));

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, controls);
        let names: Vec<_> = loaded.keys().collect();
        assert_eq!(
            names,
            ["brightness", "white_balance_automatic", "white_balance_temperature"]
        );
    }

    #[test]
    fn reads_plain_attribute_maps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.ccconf");
        fs::write(
            &path,
            r#"{"brightness": {"type": "int", "min": -64, "max": 64, "step": 1,
                 "default": 0, "value": 12},
                "exposure_time_absolute": {"type": "int", "min": 1, "max": 5000,
                 "step": 1, "default": 157, "value": 300, "flags": "inactive"}}"#,
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded["brightness"].value, Some(12));
        assert!(loaded["exposure_time_absolute"].is_inactive());
    }

    #[test]
    fn broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ccconf");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load(&path), Err(Error::Settings { .. })));
        assert!(matches!(
            load(&dir.path().join("missing.ccconf")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn profiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.ccconf"), "{}").unwrap();
        fs::write(dir.path().join("a.ccconf"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = list_profiles(dir.path()).unwrap();
        assert_eq!(
            found,
            [dir.path().join("a.ccconf"), dir.path().join("b.ccconf")]
        );
        assert!(list_profiles(&dir.path().join("nope")).unwrap().is_empty());
    }
}
