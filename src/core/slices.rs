use hashbrown::HashMap;
use regex::Regex;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::consts::*;
use crate::core::abspath;

/// How renumbered slices are placed in the substack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StagingMode {
    /// Symlink pointing at the absolute source path
    #[default]
    Symlink,
    /// Independent byte copy of the source
    Copy,
}

impl StagingMode {
    pub fn from_copy_flag(copy: bool) -> Self {
        if copy {
            StagingMode::Copy
        } else {
            StagingMode::Symlink
        }
    }
}

impl std::fmt::Display for StagingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingMode::Symlink => write!(f, "symlink"),
            StagingMode::Copy => write!(f, "copy"),
        }
    }
}

fn first_number() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"[0-9]+").expect("valid number pattern"))
}

/// Slice images of a slab directory keyed by the number in their file name.
///
/// Indices need not be contiguous.
#[derive(Debug, Clone)]
pub struct IndexedSlices {
    pub slices: HashMap<u64, PathBuf>,
    /// Extension of the first scanned file, without the dot
    pub ext: String,
}

impl IndexedSlices {
    /// Scan `dir` (non-recursively) for numbered slice images.
    ///
    /// Only `.png` and `.tif` files are kept. The index of a file is the
    /// first run of ASCII digits in its name. Files are visited in name order
    /// and the extension is taken from the first one.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the slab's slices.
    ///
    /// # Returns
    ///
    /// The indexed slices. Fails if no slice is found or a slice
    /// has no number in its name.
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// # use std::path::Path;
    /// # use substack::core::slices::IndexedSlices;
    /// let slices = IndexedSlices::scan(Path::new("/nrs/flyem/alignment/Z1217-19m/VNC/Sec02/zcorr")).unwrap();
    ///
    /// assert_eq!(slices.ext, "png");
    /// ```
    pub fn scan(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut files = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(|e| format!("ERROR: Could not read slice directory {}: {}", dir.display(), e))?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SLICE_EXTENSIONS.contains(&ext))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        files.sort();

        let ext = files
            .first()
            .and_then(|path| path.extension())
            .map(|ext| ext.to_string_lossy().into_owned())
            .ok_or_else(|| {
                format!(
                    "ERROR: No .{} files found in {}",
                    SLICE_EXTENSIONS.join("/."),
                    dir.display()
                )
            })?;

        let mut slices = HashMap::with_capacity(files.len());
        for path in files {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let index = first_number()
                .find(&name)
                .ok_or_else(|| format!("ERROR: Slice file doesn't seem to be numbered: {}", path.display()))?
                .as_str()
                .parse::<u64>()
                .map_err(|e| format!("ERROR: Bad slice number in {}: {}", path.display(), e))?;

            let path = abspath(&path)?;
            if let Some(previous) = slices.insert(index, path.clone()) {
                log::warn!(
                    "WARN: slice index {} appears twice, using {} instead of {}",
                    index,
                    path.display(),
                    previous.display()
                );
            }
        }

        Ok(Self { slices, ext })
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&PathBuf> {
        self.slices.get(&index)
    }

    /// Destination file name for the `new_index`-th renumbered slice
    pub fn renumbered_name(&self, new_index: u64) -> String {
        format!("{:0width$}.{}", new_index, self.ext, width = SLICE_INDEX_WIDTH)
    }

    /// Place slices `start..stop` into `dest` renumbered from zero.
    ///
    /// # Arguments
    ///
    /// * `start` - First slice index (inclusive).
    /// * `stop` - Last slice index (exclusive).
    /// * `dest` - Directory receiving the renumbered slices.
    /// * `mode` - Symlink or copy.
    ///
    /// # Returns
    ///
    /// The number of slices placed. Stops at the first index missing from
    /// the set, leaving the slices placed so far.
    pub fn renumber(
        &self,
        start: u64,
        stop: u64,
        dest: &Path,
        mode: StagingMode,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        if start >= stop {
            return Err(format!("ERROR: start slice {} must be less than stop slice {}", start, stop).into());
        }

        let total = (stop - start) as usize;
        for (new_index, orig_index) in (start..stop).enumerate() {
            let src = self
                .get(orig_index)
                .ok_or_else(|| format!("ERROR: Slice {} not found in input directory!", orig_index))?;
            let target = dest.join(self.renumbered_name(new_index as u64));

            match mode {
                StagingMode::Copy => {
                    fs::copy(src, &target).map_err(|e| {
                        format!("ERROR: Could not copy {} to {}: {}", src.display(), target.display(), e)
                    })?;
                }
                StagingMode::Symlink => {
                    std::os::unix::fs::symlink(src, &target).map_err(|e| {
                        format!("ERROR: Could not link {} to {}: {}", target.display(), src.display(), e)
                    })?;
                }
            }

            if (new_index + 1) % PROGRESS_EVERY == 0 {
                log::info!("INFO: {}/{} slices placed", new_index + 1, total);
            }
        }

        Ok(total)
    }
}
