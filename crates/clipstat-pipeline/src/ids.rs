//! Working-set discovery from a directory of marker files.

use std::{collections::BTreeSet, path::Path};

use crate::{Error, Result};

/// Every regular file in `dir` names one video: the id is the file name up
/// to its first `.`. Returned sorted and deduplicated.
pub fn discover_video_ids(dir: &Path) -> Result<Vec<String>> {
  if !dir.is_dir() {
    return Err(Error::MissingIdsDir(dir.to_path_buf()));
  }

  let io_err = |source| Error::Io { path: dir.to_path_buf(), source };
  let mut ids = BTreeSet::new();
  for entry in std::fs::read_dir(dir).map_err(io_err)? {
    let entry = entry.map_err(io_err)?;
    if !entry.file_type().map_err(io_err)?.is_file() {
      continue;
    }
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if let Some(id) = name.split('.').next().filter(|id| !id.is_empty()) {
      ids.insert(id.to_owned());
    }
  }

  if ids.is_empty() {
    return Err(Error::NoVideoIds(dir.to_path_buf()));
  }

  tracing::info!(count = ids.len(), dir = %dir.display(), "discovered video ids");
  Ok(ids.into_iter().collect())
}
