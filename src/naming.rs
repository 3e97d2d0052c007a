//! Where task output lands on disk.
//!
//! Per-project output goes to `<base>/projects/<project>/<category>/<resource>.<ext>`,
//! cluster-wide output to `<base>/<category>/<resource>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    base: PathBuf,
    extension: String,
    category: String,
}

impl OutputPath {
    pub fn new(base: impl AsRef<Path>, extension: &str, category: &str) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
            extension: extension.to_string(),
            category: category.to_string(),
        }
    }

    /// Same base and category with a different extension, e.g. for the
    /// stderr file that accompanies an output file.
    pub fn with_extension(&self, extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            ..self.clone()
        }
    }

    pub fn path_for(&self, project: &str, resource: &str) -> PathBuf {
        self.base
            .join("projects")
            .join(sanitize(project))
            .join(&self.category)
            .join(self.file_name(resource))
    }

    pub fn cluster_path(&self, resource: &str) -> PathBuf {
        self.base.join(&self.category).join(self.file_name(resource))
    }

    fn file_name(&self, resource: &str) -> String {
        format!("{}.{}", sanitize(resource), self.extension)
    }
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Make a name safe to use as a single path component.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => format!("_{}", cleaned),
        _ => cleaned,
    }
}
