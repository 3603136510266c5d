//! Content Extraction
//!
//! Turns a content tree into a lazy sequence of [`WorkCandidate`]s.
//!
//! ## Overview
//!
//! - Work directories are visited in name order; each is read only when the
//!   iterator reaches it.
//! - A work without a metadata file is skipped with a warning.
//! - A work whose metadata cannot be parsed is skipped with an error.
//! - Episode documents are read in file name order. A document without an
//!   `id` is dropped with a warning; an unreadable document is dropped with
//!   an error. Either way the remaining episodes of the work still proceed.
//!
//! ## Usage
//!
//! ```ignore
//! use core_content::{ContentExtractor, ContentTree};
//! use core_runtime::config::ContentLayout;
//!
//! let tree = ContentTree::open("data", ContentLayout::default())?;
//! let extractor = ContentExtractor::new(tree);
//! let mut units = extractor.extract()?;
//! for work in units.by_ref() {
//!     println!("{}: {} episodes", work.name, work.episodes.len());
//! }
//! println!("skipped: {}", units.stats().works_skipped);
//! ```

use core_runtime::logging::strip_path;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::candidate::{EpisodeCandidate, EpisodeId, WorkCandidate};
use crate::document::{read_document, read_metadata_file};
use crate::error::Result;
use crate::layout::{ContentTree, WorkDir};

/// Counters collected while the sequence is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub works_seen: usize,
    pub works_skipped: usize,
    pub episodes_read: usize,
    pub episodes_dropped: usize,
}

/// Reads works and episodes from a [`ContentTree`].
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    tree: ContentTree,
}

impl ContentExtractor {
    pub fn new(tree: ContentTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Start a pass over the tree.
    ///
    /// Only the top-level listing happens here; every work is read lazily.
    pub fn extract(&self) -> Result<WorkUnits<'_>> {
        let dirs = self.tree.work_dirs()?;
        debug!(root = %self.tree.root().display(), works = dirs.len(), "Listed work directories");
        Ok(WorkUnits {
            tree: &self.tree,
            dirs: dirs.into_iter(),
            stats: ExtractionStats::default(),
        })
    }
}

/// Lazy, single-pass sequence of work candidates.
pub struct WorkUnits<'a> {
    tree: &'a ContentTree,
    dirs: std::vec::IntoIter<WorkDir>,
    stats: ExtractionStats,
}

impl WorkUnits<'_> {
    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }

    fn read_work(&mut self, dir: WorkDir) -> Option<WorkCandidate> {
        if !dir.has_metadata() {
            warn!(
                work = %dir.name,
                file = %self.tree.layout().metadata_file_name,
                "Skipping work: metadata file not found"
            );
            return None;
        }

        let fields = match read_metadata_file(dir.metadata_path()) {
            Ok(fields) => fields,
            Err(e) => {
                error!(work = %dir.name, error = %e, "Skipping work: unreadable metadata");
                return None;
            }
        };

        if !dir.has_episodes_dir() {
            warn!(
                work = %dir.name,
                directory = %self.tree.layout().episodes_dir_name,
                "Episode directory not found; work has no episodes"
            );
        }

        let files = match self.tree.episode_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                error!(work = %dir.name, error = %e, "Failed to list episodes");
                Vec::new()
            }
        };

        let mut episodes = Vec::with_capacity(files.len());
        for file in files {
            match read_episode(&dir.name, &file) {
                Some(episode) => {
                    self.stats.episodes_read += 1;
                    episodes.push(episode);
                }
                None => self.stats.episodes_dropped += 1,
            }
        }

        debug!(work = %dir.name, episodes = episodes.len(), "Extracted work");

        Some(WorkCandidate {
            name: dir.name,
            source: dir.path,
            fields,
            episodes,
        })
    }
}

impl Iterator for WorkUnits<'_> {
    type Item = WorkCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(dir) = self.dirs.next() {
            self.stats.works_seen += 1;
            match self.read_work(dir) {
                Some(work) => return Some(work),
                None => self.stats.works_skipped += 1,
            }
        }
        None
    }
}

fn read_episode(work: &str, path: &Path) -> Option<EpisodeCandidate> {
    let full = path.to_string_lossy();
    let file = strip_path(&full);

    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            error!(work = %work, file = %file, error = %e, "Failed to read episode");
            return None;
        }
    };

    let Some(id) = EpisodeId::from_fields(&document.metadata) else {
        warn!(work = %work, file = %file, "Episode missing 'id', skipping");
        return None;
    };

    Some(EpisodeCandidate {
        source: path.to_path_buf(),
        id,
        fields: document.metadata,
        content: document.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::config::ContentLayout;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write_work(root: &Path, name: &str, info: Option<&str>, episodes: &[(&str, &str)]) {
        let work = root.join(name);
        fs::create_dir_all(work.join("manuscript")).unwrap();
        if let Some(info) = info {
            fs::write(work.join("info.yml"), info).unwrap();
        }
        for (file, text) in episodes {
            fs::write(work.join("manuscript").join(file), text).unwrap();
        }
    }

    fn extractor(dir: &TempDir) -> ContentExtractor {
        ContentExtractor::new(ContentTree::open(dir.path(), ContentLayout::default()).unwrap())
    }

    #[test]
    fn test_extracts_work_and_episodes_in_order() {
        let dir = tempdir().unwrap();
        write_work(
            dir.path(),
            "night-train",
            Some("title: Night Train\nauthor: K\n"),
            &[
                ("002.md", "---\nid: 2\n---\nSecond"),
                ("001.md", "---\nid: 1\ntitle: First\n---\nFirst"),
            ],
        );

        let extractor = extractor(&dir);
        let works: Vec<WorkCandidate> = extractor.extract().unwrap().collect();

        assert_eq!(works.len(), 1);
        let work = &works[0];
        assert_eq!(work.name, "night-train");
        assert_eq!(work.fields.get("title"), Some(&json!("Night Train")));
        let ids: Vec<&str> = work.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(work.episodes[0].content, "First");
        assert_eq!(work.episodes[0].file_name(), "001.md");
    }

    #[test]
    fn test_missing_metadata_skips_work() {
        let dir = tempdir().unwrap();
        write_work(dir.path(), "no-info", None, &[("001.md", "---\nid: 1\n---\nx")]);
        write_work(dir.path(), "ok", Some("title: T\nauthor: A\n"), &[]);

        let extractor = extractor(&dir);
        let mut units = extractor.extract().unwrap();
        let names: Vec<String> = units.by_ref().map(|w| w.name).collect();

        assert_eq!(names, vec!["ok"]);
        assert_eq!(units.stats().works_seen, 2);
        assert_eq!(units.stats().works_skipped, 1);
    }

    #[test]
    fn test_malformed_metadata_skips_work_and_continues() {
        let dir = tempdir().unwrap();
        write_work(dir.path(), "a-broken", Some("title: [unclosed\n"), &[]);
        write_work(dir.path(), "b-fine", Some("title: T\nauthor: A\n"), &[]);

        let extractor = extractor(&dir);
        let names: Vec<String> = extractor.extract().unwrap().map(|w| w.name).collect();
        assert_eq!(names, vec!["b-fine"]);
    }

    #[test]
    fn test_episode_without_id_dropped_individually() {
        let dir = tempdir().unwrap();
        write_work(
            dir.path(),
            "book",
            Some("title: T\nauthor: A\n"),
            &[
                ("001.md", "---\ntitle: no id\n---\nBody"),
                ("002.md", "---\nid: 2\n---\nBody"),
                ("003.md", "---\nid: 3\nbroken: [\n---\nBody"),
            ],
        );

        let extractor = extractor(&dir);
        let mut units = extractor.extract().unwrap();
        let work = units.next().unwrap();

        assert_eq!(work.episodes.len(), 1);
        assert_eq!(work.episodes[0].id.as_str(), "2");
        assert_eq!(units.stats().episodes_dropped, 2);
        assert_eq!(units.stats().episodes_read, 1);
    }

    #[test]
    fn test_work_without_episode_directory() {
        let dir = tempdir().unwrap();
        let work = dir.path().join("lonely");
        fs::create_dir(&work).unwrap();
        fs::write(work.join("info.yml"), "title: T\nauthor: A\n").unwrap();

        let extractor = extractor(&dir);
        let works: Vec<WorkCandidate> = extractor.extract().unwrap().collect();
        assert_eq!(works.len(), 1);
        assert!(works[0].episodes.is_empty());
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let extractor = extractor(&dir);
        assert_eq!(extractor.extract().unwrap().count(), 0);
    }
}
