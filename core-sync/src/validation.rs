//! # Content Validator
//!
//! Checks a content tree without contacting the store. Every work and every
//! episode is checked; nothing short-circuits. Problems that would exclude
//! content from a sync are errors, anything merely suspicious is a warning.

use core_content::{
    read_document, read_metadata_file, ContentTree, EpisodeId, Fields, WorkDir,
};
use core_runtime::config::ContentLayout;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::classifier::{
    parse_declared_id, parse_flag, required_text, LifecycleMarker, AUTHOR_FIELD,
    DECLARED_ID_FIELD, PUBLISHED_FIELD, TITLE_FIELD,
};
use crate::error::ValidationIssue;
use crate::Result;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Path relative to the content root
    pub location: PathBuf,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location.display(), self.message)
    }
}

/// Collected findings of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub works_checked: usize,
    pub episodes_checked: usize,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    /// True when no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates content trees laid out per a [`ContentLayout`].
#[derive(Debug, Clone, Default)]
pub struct ContentValidator {
    layout: ContentLayout,
    /// Treat a work without `published` as invalid
    require_publication_flag: bool,
}

struct Collector<'a> {
    root: &'a Path,
    report: ValidationReport,
}

impl Collector<'_> {
    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.root).unwrap_or(path).to_path_buf()
    }

    fn error(&mut self, path: &Path, message: impl Into<String>) {
        let finding = Finding {
            severity: Severity::Error,
            location: self.relative(path),
            message: message.into(),
        };
        error!(location = %finding.location.display(), "{}", finding.message);
        self.report.errors.push(finding);
    }

    fn warning(&mut self, path: &Path, message: impl Into<String>) {
        let finding = Finding {
            severity: Severity::Warning,
            location: self.relative(path),
            message: message.into(),
        };
        warn!(location = %finding.location.display(), "{}", finding.message);
        self.report.warnings.push(finding);
    }
}

impl ContentValidator {
    pub fn new(layout: ContentLayout) -> Self {
        Self {
            layout,
            require_publication_flag: false,
        }
    }

    /// Apply the same publication-flag rule as a sync with
    /// `require_publication_flag` set.
    pub fn require_publication_flag(mut self, required: bool) -> Self {
        self.require_publication_flag = required;
        self
    }

    /// Validate the tree at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the root is missing or cannot be listed.
    pub fn validate(&self, root: &Path) -> Result<ValidationReport> {
        let tree = ContentTree::open(root, self.layout.clone())?;
        let mut collector = Collector {
            root: tree.root(),
            report: ValidationReport::default(),
        };

        info!(root = %root.display(), "Validating content");
        for work in tree.work_dirs()? {
            self.check_work(&tree, &work, &mut collector);
        }

        let report = collector.report;
        info!(
            works = report.works_checked,
            episodes = report.episodes_checked,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validation finished"
        );
        Ok(report)
    }

    fn check_work(&self, tree: &ContentTree, work: &WorkDir, out: &mut Collector<'_>) {
        out.report.works_checked += 1;
        debug!(work = %work.name, "Checking work");

        if work.has_metadata() {
            match read_metadata_file(work.metadata_path()) {
                Ok(fields) => self.check_work_fields(work.metadata_path(), &fields, out),
                Err(e) => out.error(work.metadata_path(), format!("Cannot parse metadata: {}", e)),
            }
        } else {
            out.error(
                work.metadata_path(),
                format!("Missing {}", self.layout.metadata_file_name),
            );
        }

        if !work.has_episodes_dir() {
            out.warning(
                work.episodes_dir(),
                format!("Missing {} directory", self.layout.episodes_dir_name),
            );
            return;
        }

        let files = match tree.episode_files(work) {
            Ok(files) => files,
            Err(e) => {
                out.error(work.episodes_dir(), format!("Cannot list episodes: {}", e));
                return;
            }
        };
        if files.is_empty() {
            out.warning(work.episodes_dir(), "No episode files found");
            return;
        }

        let mut seen: HashMap<EpisodeId, PathBuf> = HashMap::new();
        for file in files {
            out.report.episodes_checked += 1;
            check_episode(&file, &mut seen, out);
        }
    }

    fn check_work_fields(&self, path: &Path, fields: &Fields, out: &mut Collector<'_>) {
        for field in [TITLE_FIELD, AUTHOR_FIELD] {
            if required_text(fields, field).is_none() {
                out.error(path, ValidationIssue::MissingField { field }.to_string());
            }
        }

        if self.require_publication_flag && parse_flag(fields.get(PUBLISHED_FIELD)).is_none() {
            let issue = ValidationIssue::MissingField {
                field: PUBLISHED_FIELD,
            };
            out.error(path, issue.to_string());
        }

        match fields.get(DECLARED_ID_FIELD) {
            None | Some(Value::Null) => {}
            Some(value) => {
                if let Err(issue) = parse_declared_id(value) {
                    out.error(path, issue.to_string());
                }
            }
        }
    }
}

fn check_episode(path: &Path, seen: &mut HashMap<EpisodeId, PathBuf>, out: &mut Collector<'_>) {
    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            out.error(path, format!("Cannot read episode: {}", e));
            return;
        }
    };

    match EpisodeId::from_fields(&document.metadata) {
        Some(id) => {
            if let Some(first) = seen.get(&id) {
                let issue = ValidationIssue::DuplicateEpisodeId {
                    id: id.to_string(),
                    first: file_name(first),
                    second: file_name(path),
                };
                out.error(path, issue.to_string());
            } else {
                seen.insert(id, path.to_path_buf());
            }
        }
        None => out.error(path, "Missing required field 'id'"),
    }

    if required_text(&document.metadata, TITLE_FIELD).is_none() {
        out.warning(path, "Missing 'title'");
    }

    if document.body.is_empty() {
        out.warning(path, "Empty content");
    }

    if let LifecycleMarker::Unrecognized(status) = LifecycleMarker::from_fields(&document.metadata) {
        out.warning(path, format!("Unrecognized status '{}'", status));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncError;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn validate(root: &Path) -> ValidationReport {
        ContentValidator::default().validate(root).unwrap()
    }

    #[test]
    fn test_clean_tree_is_valid() {
        let dir = tempdir().unwrap();
        write(dir.path(), "book/info.yml", "title: T\nauthor: A\n");
        write(dir.path(), "book/manuscript/001.md", "---\nid: 1\ntitle: One\n---\nText");

        let report = validate(dir.path());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.works_checked, 1);
        assert_eq!(report.episodes_checked, 1);
    }

    #[test]
    fn test_missing_id_is_error_and_empty_body_is_warning() {
        let dir = tempdir().unwrap();
        write(dir.path(), "book/info.yml", "title: T\nauthor: A\n");
        write(dir.path(), "book/manuscript/001.md", "---\ntitle: One\n---\n   \n");

        let report = validate(dir.path());
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("'id'"));
        assert_eq!(report.errors[0].location, PathBuf::from("book/manuscript/001.md"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].message, "Empty content");
    }

    #[test]
    fn test_work_level_errors_collected_without_short_circuit() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/info.yml", "id: abc\n");
        fs::create_dir_all(dir.path().join("b/manuscript")).unwrap();
        write(dir.path(), "c/info.yml", "title: [broken\n");

        let report = validate(dir.path());
        let messages: Vec<String> = report.errors.iter().map(|f| f.to_string()).collect();

        assert_eq!(report.works_checked, 3);
        assert!(messages.contains(&"a/info.yml: Missing required field 'title'".to_string()));
        assert!(messages.contains(&"a/info.yml: Missing required field 'author'".to_string()));
        assert!(messages.iter().any(|m| m.starts_with("a/info.yml: Invalid id 'abc'")));
        assert!(messages.contains(&"b/info.yml: Missing info.yml".to_string()));
        assert!(messages.iter().any(|m| m.starts_with("c/info.yml: Cannot parse metadata")));

        let warnings: Vec<String> = report.warnings.iter().map(|f| f.to_string()).collect();
        assert!(warnings.contains(&"a/manuscript: Missing manuscript directory".to_string()));
        assert!(warnings.contains(&"b/manuscript: No episode files found".to_string()));
    }

    #[test]
    fn test_duplicate_episode_ids_reported() {
        let dir = tempdir().unwrap();
        write(dir.path(), "book/info.yml", "title: T\nauthor: A\n");
        write(dir.path(), "book/manuscript/001.md", "---\nid: 1\ntitle: a\n---\nx");
        write(dir.path(), "book/manuscript/002.md", "---\nid: \"1\"\ntitle: b\n---\ny");

        let report = validate(dir.path());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].message,
            "Duplicate episode ID '1' (001.md and 002.md)"
        );
    }

    #[test]
    fn test_episode_warnings() {
        let dir = tempdir().unwrap();
        write(dir.path(), "book/info.yml", "title: T\nauthor: A\n");
        write(dir.path(), "book/manuscript/001.md", "---\nid: 1\nstatus: review\n---\nx");
        write(dir.path(), "book/manuscript/002.md", "---\nid: 2\n---\nunterminated");
        write(dir.path(), "book/manuscript/003.md", "---\nid: 3\ntitle: ok\n");

        let report = validate(dir.path());
        let warnings: Vec<&str> = report.warnings.iter().map(|f| f.message.as_str()).collect();

        assert!(warnings.contains(&"Missing 'title'"));
        assert!(warnings.contains(&"Unrecognized status 'review'"));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with("Cannot read episode"));
    }

    #[test]
    fn test_publication_flag_required_when_enabled() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/info.yml", "title: T\nauthor: A\n");
        write(dir.path(), "a/manuscript/001.md", "---\nid: 1\ntitle: x\n---\nx");
        write(dir.path(), "b/info.yml", "title: T\nauthor: A\npublished: \"yes\"\n");
        write(dir.path(), "b/manuscript/001.md", "---\nid: 1\ntitle: x\n---\nx");

        assert!(validate(dir.path()).is_valid());

        let report = ContentValidator::default()
            .require_publication_flag(true)
            .validate(dir.path())
            .unwrap();
        let messages: Vec<String> = report.errors.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            messages,
            vec!["a/info.yml: Missing required field 'published'".to_string()]
        );
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let err = ContentValidator::default()
            .validate(&dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Content(_)));
    }
}
