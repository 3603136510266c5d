//! # Content Module
//!
//! Reads the authored content tree: one directory per work, each holding a
//! YAML metadata file and a directory of episode documents with frontmatter.
//!
//! ## Components
//!
//! - **Layout** (`layout`): locates work directories and episode documents
//! - **Documents** (`document`): YAML metadata and frontmatter parsing
//! - **Candidates** (`candidate`): raw work/episode records, episode identity
//! - **Extractor** (`extractor`): lazy single-pass sequence of work candidates

pub mod candidate;
pub mod document;
pub mod error;
pub mod extractor;
pub mod layout;

pub use candidate::{EpisodeCandidate, EpisodeId, WorkCandidate, EPISODE_ID_FIELD};
pub use document::{parse_document, parse_metadata, read_document, read_metadata_file, Document, Fields};
pub use error::{ContentError, Result};
pub use extractor::{ContentExtractor, ExtractionStats, WorkUnits};
pub use layout::{ContentTree, WorkDir};
