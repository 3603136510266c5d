//! Content tree layout
//!
//! ```text
//! <root>/
//!   <work>/                 one directory per work, hidden entries ignored
//!     info.yml              work metadata
//!     manuscript/
//!       001.md              one document per episode
//!       002.md
//! ```
//!
//! File names come from [`ContentLayout`].

use core_runtime::config::ContentLayout;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ContentError, Result};

/// An opened content root.
#[derive(Debug, Clone)]
pub struct ContentTree {
    root: PathBuf,
    layout: ContentLayout,
}

/// One candidate work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    /// Directory name, used in logs and reports
    pub name: String,
    pub path: PathBuf,
    metadata_path: PathBuf,
    episodes_dir: PathBuf,
}

impl ContentTree {
    /// Open a content root.
    ///
    /// # Errors
    ///
    /// Fails when the root does not exist or is not a directory.
    pub fn open(root: impl Into<PathBuf>, layout: ContentLayout) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(ContentError::RootNotFound(root));
        }
        if !root.is_dir() {
            return Err(ContentError::RootNotDirectory(root));
        }
        Ok(Self { root, layout })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    /// Non-hidden subdirectories of the root, sorted by name.
    pub fn work_dirs(&self) -> Result<Vec<WorkDir>> {
        let entries = fs::read_dir(&self.root).map_err(|e| ContentError::io(&self.root, e))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ContentError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            dirs.push(WorkDir {
                metadata_path: path.join(&self.layout.metadata_file_name),
                episodes_dir: path.join(&self.layout.episodes_dir_name),
                name,
                path,
            });
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dirs)
    }

    /// Episode documents of a work, in lexicographic file name order.
    ///
    /// Returns an empty list when the episode directory is absent.
    pub fn episode_files(&self, work: &WorkDir) -> Result<Vec<PathBuf>> {
        if !work.episodes_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&work.episodes_dir).map_err(|e| ContentError::io(&work.episodes_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ContentError::io(&work.episodes_dir, e))?;
            let path = entry.path();
            let matches_extension = path
                .extension()
                .map(|ext| ext.to_str() == Some(self.layout.episode_extension.as_str()))
                .unwrap_or(false);
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_file() && matches_extension && !hidden {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

impl WorkDir {
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn episodes_dir(&self) -> &Path {
        &self.episodes_dir
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata_path.is_file()
    }

    pub fn has_episodes_dir(&self) -> bool {
        self.episodes_dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_root() {
        let dir = tempdir().unwrap();
        let err = ContentTree::open(dir.path().join("nope"), ContentLayout::default()).unwrap_err();
        assert!(matches!(err, ContentError::RootNotFound(_)));
    }

    #[test]
    fn test_open_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = ContentTree::open(&file, ContentLayout::default()).unwrap_err();
        assert!(matches!(err, ContentError::RootNotDirectory(_)));
    }

    #[test]
    fn test_work_dirs_skip_hidden_and_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b-book")).unwrap();
        fs::create_dir(dir.path().join("a-book")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();

        let tree = ContentTree::open(dir.path(), ContentLayout::default()).unwrap();
        let names: Vec<String> = tree.work_dirs().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["a-book", "b-book"]);
    }

    #[test]
    fn test_episode_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let manuscript = dir.path().join("book").join("manuscript");
        fs::create_dir_all(&manuscript).unwrap();
        fs::write(manuscript.join("010.md"), "").unwrap();
        fs::write(manuscript.join("002.md"), "").unwrap();
        fs::write(manuscript.join("notes.txt"), "").unwrap();
        fs::write(manuscript.join(".draft.md"), "").unwrap();

        let tree = ContentTree::open(dir.path(), ContentLayout::default()).unwrap();
        let work = tree.work_dirs().unwrap().remove(0);
        assert!(work.has_episodes_dir());
        assert!(!work.has_metadata());

        let files: Vec<String> = tree
            .episode_files(&work)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["002.md", "010.md"]);
    }

    #[test]
    fn test_episode_files_without_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("book")).unwrap();

        let tree = ContentTree::open(dir.path(), ContentLayout::default()).unwrap();
        let work = tree.work_dirs().unwrap().remove(0);
        assert!(tree.episode_files(&work).unwrap().is_empty());
    }
}
