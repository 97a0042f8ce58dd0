//! Markdown parser for flashcard files.
//!
//! # Format
//! ```markdown
//! # Rust
//!
//! ## What is ownership?
//! Every value has exactly one owner.
//!
//! ## What does `Drop` do?
//! Runs cleanup code when a value goes out of scope.
//! ```
//!
//! Every level-2 heading starts a card. The heading text is the front, and
//! everything up to the next level-2 heading (or the end of the file) is the
//! back. Text before the first level-2 heading is ignored.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScanError;
use crate::identity::compute_hash;
use crate::types::SourceCard;

/// Extension of source documents.
const MARKDOWN_EXTENSION: &str = "md";

/// Front/back pair cut out of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCard {
    pub front: String,
    pub back: String,
}

/// Split markdown content into cards.
///
/// Sections with an empty front or an empty back are dropped.
pub fn parse(content: &str) -> Vec<RawCard> {
    let mut headings: Vec<Heading<'_>> = Vec::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        if let LineType::Heading(text) = parse_line(body) {
            headings.push(Heading {
                text,
                start: offset,
                end: offset + body.len(),
            });
        }
        offset += line.len();
    }

    let mut cards = Vec::new();
    for (idx, heading) in headings.iter().enumerate() {
        let section_end = headings
            .get(idx + 1)
            .map_or(content.len(), |next| next.start);

        let front = heading.text.trim();
        let back = content[heading.end..section_end].trim();
        if front.is_empty() || back.is_empty() {
            continue;
        }

        cards.push(RawCard {
            front: front.to_string(),
            back: back.to_string(),
        });
    }
    cards
}

struct Heading<'a> {
    text: &'a str,
    /// Byte offset of the first character of the heading line.
    start: usize,
    /// Byte offset just past the heading text, before the line break.
    end: usize,
}

enum LineType<'a> {
    Heading(&'a str),
    Text,
}

fn parse_line(line: &str) -> LineType<'_> {
    match line.strip_prefix("## ") {
        Some(rest) if !rest.is_empty() => LineType::Heading(rest),
        _ => LineType::Text,
    }
}

/// A resolved scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    /// Canonical path of the root directory.
    pub path: PathBuf,
    /// Directory name; it is the top deck and the origin prefix.
    pub name: String,
}

impl SourceRoot {
    /// Canonicalize `root` and take its directory name.
    ///
    /// Paths such as `.` or `notes/sub/..` resolve to the directory they
    /// point at. A root without a name (the filesystem root) is rejected.
    pub fn resolve(root: &Path) -> Result<Self, ScanError> {
        let path = match root.canonicalize() {
            Ok(path) if path.is_dir() => path,
            _ => return Err(ScanError::NotADirectory(root.to_path_buf())),
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ScanError::UnnamedRoot(path.clone()))?;
        Ok(Self { path, name })
    }
}

/// Parse every markdown file below `root`, in path order.
///
/// A tree without markdown files yields no cards; that is not an error.
pub fn scan_directory(root: &Path) -> Result<Vec<SourceCard>, ScanError> {
    scan_root(&SourceRoot::resolve(root)?)
}

/// Parse every markdown file below an already resolved root.
pub fn scan_root(root: &SourceRoot) -> Result<Vec<SourceCard>, ScanError> {
    let files = markdown_files(&root.path)?;
    if files.is_empty() {
        tracing::warn!("No markdown files found in {}", root.path.display());
        return Ok(vec![]);
    }

    let mut cards = Vec::new();
    for file in &files {
        cards.extend(parse_file(file, root)?);
    }
    tracing::debug!(
        files = files.len(),
        cards = cards.len(),
        "scanned {}",
        root.path.display()
    );
    Ok(cards)
}

/// Parse one markdown file that lives somewhere below `root`.
pub fn parse_file(file: &Path, root: &SourceRoot) -> Result<Vec<SourceCard>, ScanError> {
    let content = fs::read_to_string(file).map_err(|source| ScanError::Read {
        path: file.to_path_buf(),
        source,
    })?;

    let relative = file.strip_prefix(&root.path).unwrap_or(file);
    let deck_path = deck_path(relative, &root.name);
    let source_file = source_file(relative, &root.name);

    Ok(parse(&content)
        .into_iter()
        .map(|raw| SourceCard {
            source_hash: compute_hash(&raw.front),
            front_raw: raw.front,
            back_raw: raw.back,
            deck_path: deck_path.clone(),
            source_file: source_file.clone(),
        })
        .collect())
}

fn markdown_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == MARKDOWN_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn deck_path(relative: &Path, root_name: &str) -> Vec<String> {
    let mut segments = vec![root_name.to_string()];
    if let Some(parent) = relative.parent() {
        segments.extend(normal_components(parent));
    }
    segments
}

fn source_file(relative: &Path, root_name: &str) -> String {
    let mut parts = vec![root_name.to_string()];
    parts.extend(normal_components(relative));
    parts.join("/")
}

fn normal_components(path: &Path) -> impl Iterator<Item = String> + '_ {
    path.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    })
}
