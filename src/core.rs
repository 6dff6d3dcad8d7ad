pub mod launch;
pub mod prepare;
pub mod slices;
pub mod template;

pub use launch::launch;
pub use prepare::{prepare, PrepareRequest};

use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// Absolute, lexically normalized form of `path`.
///
/// Symlinks are not resolved, so the result names the path
/// the way the user wrote it.
///
/// # Example
///
/// ```rust, no_run
/// # use std::path::{Path, PathBuf};
/// # use substack::core::abspath;
/// let p = abspath(Path::new("/data/./substacks/../s1/")).unwrap();
///
/// assert_eq!(p, PathBuf::from("/data/s1"));
/// ```
pub fn abspath(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let abs = std::path::absolute(path)
        .map_err(|e| format!("ERROR: Could not resolve {}: {}", path.display(), e))?;

    Ok(abs.clean())
}
