//! Loading preset documents and walking their `include` graph.
//!
//! Include paths are relative to the including document. Each file is loaded at
//! most once per walk; a file reached a second time (through a diamond or a
//! cycle) contributes nothing further and is not an error.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::types::{ConfigDocument, PresetError};

/// Read and parse a single preset document.
pub fn load(path: &Path) -> Result<ConfigDocument, PresetError> {
  trace!(path = %path.display(), "loading preset document");
  let text = fs::read_to_string(path).map_err(|source| PresetError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  ConfigDocument::parse(path, &text)
}

/// Load `path` and every document it transitively includes.
///
/// The returned list starts with the root document and continues in
/// depth-first, declaration order.
pub fn load_all(path: &Path) -> Result<Vec<ConfigDocument>, PresetError> {
  resolve_includes(load(path)?)
}

/// Walk the includes of an already loaded root document.
pub fn resolve_includes(root: ConfigDocument) -> Result<Vec<ConfigDocument>, PresetError> {
  let mut visited = HashSet::new();
  visited.insert(visit_key(&root.path));

  let mut documents = Vec::new();
  walk(root, &mut visited, &mut documents)?;
  debug!(count = documents.len(), "preset documents loaded");
  Ok(documents)
}

fn walk(
  document: ConfigDocument,
  visited: &mut HashSet<PathBuf>,
  documents: &mut Vec<ConfigDocument>,
) -> Result<(), PresetError> {
  let base_dir = document.path.parent().map(Path::to_path_buf).unwrap_or_default();
  let includes = document.include.clone();
  documents.push(document);

  for include in includes {
    let include_path = base_dir.join(&include);
    let key = visit_key(&include_path);

    if !visited.insert(key) {
      trace!(path = %include_path.display(), "include already visited, skipping");
      continue;
    }

    if !include_path.exists() {
      warn!(path = %include_path.display(), "included preset file does not exist, skipping");
      continue;
    }

    let included = load(&include_path)?;
    walk(included, visited, documents)?;
  }

  Ok(())
}

/// Identity of a file for the visited set.
fn visit_key(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
