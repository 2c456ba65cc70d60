use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const DATA_EXTENSIONS: &[&str] = &["csv"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "m4v"];

/// Files of interest found under a search root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovered {
    /// CSV files, including any T0 marker.
    pub data_files: Vec<PathBuf>,
    pub video_files: Vec<PathBuf>,
}

/// Walk `root` recursively and collect data and video files.
///
/// Both lists are sorted so repeated runs plot in the same order.
pub fn discover(root: &Path) -> Result<Discovered> {
    let mut found = Discovered::default();
    walk(root, &mut found)?;
    found.data_files.sort();
    found.video_files.sort();
    log::debug!(
        "Found {} data files and {} videos under {}",
        found.data_files.len(),
        found.video_files.len(),
        root.display()
    );
    Ok(found)
}

fn walk(dir: &Path, found: &mut Discovered) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("inspecting {}", path.display()))?;

        if file_type.is_dir() {
            walk(&path, found)?;
        } else if has_extension(&path, DATA_EXTENSIONS) {
            found.data_files.push(path);
        } else if has_extension(&path, VIDEO_EXTENSIONS) {
            found.video_files.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| wanted.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_data_and_videos_recursively() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("day1/cam")).unwrap();
        fs::write(root.join("Thrust.csv"), "0,0\n").unwrap();
        fs::write(root.join("day1/Chamber.CSV"), "0,0\n").unwrap();
        fs::write(root.join("day1/cam/fire.MP4"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let found = discover(root).unwrap();
        let mut expected = vec![root.join("Thrust.csv"), root.join("day1/Chamber.CSV")];
        expected.sort();
        assert_eq!(found.data_files, expected);
        assert_eq!(found.video_files, vec![root.join("day1/cam/fire.MP4")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(discover(&dir.path().join("nope")).is_err());
    }
}
