use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::pipeline::DataItem;

/// List the messages of a corpus: regular files of `dir` with the given
/// extension, in lexicographic order of their path.
///
/// Other entries (subdirectories, other extensions, a file named only
/// `.eml`) are skipped without notice. Failing to read the directory itself
/// is an error.
pub async fn load(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("unable to read corpus directory {}", dir.display()))?;

    let mut messages = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(true, |e| e != extension) {
            continue;
        }
        // follows symlinks, like a plain `stat`
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => messages.push(path),
            Ok(_) => (),
            Err(err) => tracing::debug!(path=%path.display(), err=%err, "skipping entry"),
        }
    }

    messages.sort();
    tracing::debug!(dir=%dir.display(), count=messages.len(), "corpus loaded");
    Ok(messages)
}

/// `corpus/hello.eml` + `.dovecot` + body → `corpus/hello.dovecot.body`
pub fn artifact_path(message: &Path, suffix: &str, item: DataItem) -> PathBuf {
    let mut name = message
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    name.push(".");
    name.push(item.extension());
    message.with_file_name(name)
}
