use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    config::{Config, SubstackParams},
    consts::*,
    core::{
        abspath,
        slices::{IndexedSlices, StagingMode},
        template,
    },
    executor::{quote, shell_checked},
};

/// Everything needed to materialize one substack
///
/// # Fields
///
/// * `fly` - Fly identifier.
/// * `region` - Region of the fly, only used for the default slice directory.
/// * `slab` - Slab number, rendered as `Sec{slab:02}`.
/// * `start` - First slice (inclusive).
/// * `stop` - Last slice (exclusive).
/// * `input_slice_dir` - Source slices, defaults to the configured pattern.
/// * `substack_name` - Defaults to `substack-Sec02-z10000-z10100`.
/// * `parent_output_dir` - Directory the substack is created in.
/// * `mode` - Symlink or copy the slices.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareRequest {
    pub fly: String,
    pub region: String,
    pub slab: u32,
    pub start: u64,
    pub stop: u64,
    pub input_slice_dir: Option<PathBuf>,
    pub substack_name: Option<String>,
    pub parent_output_dir: PathBuf,
    pub mode: StagingMode,
}

impl PrepareRequest {
    pub fn tab_name(&self) -> String {
        tab_name(self.slab)
    }

    pub fn substack_name(&self) -> String {
        self.substack_name
            .clone()
            .unwrap_or_else(|| default_substack_name(&self.tab_name(), self.start, self.stop))
    }

    pub fn input_slice_dir(&self, config: &Config) -> PathBuf {
        self.input_slice_dir
            .clone()
            .unwrap_or_else(|| config.slice_dir(&self.fly, &self.region, &self.tab_name()))
    }
}

/// Slab identifier for a slab number
///
/// # Example
///
/// ```rust, no_run
/// # use substack::core::prepare::tab_name;
/// assert_eq!(tab_name(2), "Sec02");
/// ```
pub fn tab_name(slab: u32) -> String {
    format!("Sec{:02}", slab)
}

/// Default substack name, unique per slab and slice range
///
/// # Example
///
/// ```rust, no_run
/// # use substack::core::prepare::default_substack_name;
/// assert_eq!(default_substack_name("Sec02", 10000, 10100), "substack-Sec02-z10000-z10100");
/// ```
pub fn default_substack_name(tab_name: &str, start: u64, stop: u64) -> String {
    format!(
        "substack-{}-z{:0width$}-z{:0width$}",
        tab_name,
        start,
        stop,
        width = SLICE_INDEX_WIDTH
    )
}

/// Create a substack directory from the template and
/// fill it with renumbered slices.
///
/// # Arguments
///
/// * `request` - What to prepare.
/// * `config` - Deployment configuration.
///
/// # Returns
///
/// The absolute path of the new substack directory.
///
/// # Example
///
/// ```rust, no_run
/// # use std::path::PathBuf;
/// # use substack::config::Config;
/// # use substack::core::{prepare, PrepareRequest};
/// # use substack::core::slices::StagingMode;
/// let request = PrepareRequest {
///     fly: "Z1217-19m".into(),
///     region: "VNC".into(),
///     slab: 2,
///     start: 10000,
///     stop: 10100,
///     input_slice_dir: None,
///     substack_name: None,
///     parent_output_dir: PathBuf::from("."),
///     mode: StagingMode::Symlink,
/// };
///
/// let base_dir = prepare(&request, &Config::default()).unwrap();
/// ```
///
/// # Note
///
/// * Steps run in order and the first failure aborts the rest.
///   Nothing already created is removed.
pub fn prepare(request: &PrepareRequest, config: &Config) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if request.start >= request.stop {
        return Err(format!(
            "ERROR: start slice {} must be less than stop slice {}",
            request.start, request.stop
        )
        .into());
    }

    check_template(config)?;

    let substack_name = request.substack_name();
    let substack_base_dir = abspath(&request.parent_output_dir)?.join(&substack_name);
    let input_slice_dir = request.input_slice_dir(config);

    let params = SubstackParams::new(
        &substack_name,
        &substack_base_dir,
        &request.fly,
        &request.tab_name(),
        &config.bill_to,
    )?;

    log::info!("INFO: Creating {}", substack_base_dir.display());
    let rendered = template::render(
        &config.template_dir,
        &params.context(),
        substack_base_dir.parent().unwrap_or(Path::new("/")),
    )?;
    if rendered != substack_base_dir {
        return Err(format!(
            "ERROR: Template rendered {} instead of {}",
            rendered.display(),
            substack_base_dir.display()
        )
        .into());
    }

    let substack_slice_dir = PathBuf::from(&params.substack_slice_dir);
    fs::create_dir(&substack_slice_dir)
        .map_err(|e| format!("ERROR: Could not create {}: {}", substack_slice_dir.display(), e))?;
    let logs_dir = substack_base_dir.join(LOGS);
    fs::create_dir(&logs_dir)
        .map_err(|e| format!("ERROR: Could not create {}: {}", logs_dir.display(), e))?;

    params.write()?;

    shell_checked(
        &format!("chmod -R g+w {}", quote(&substack_base_dir.display().to_string())),
        "chmod",
    )?;

    log::info!("INFO: Reading filenames in {}", input_slice_dir.display());
    let slices = IndexedSlices::scan(&input_slice_dir)?;
    log::info!("INFO: Found {} numbered .{} slices", slices.len(), slices.ext);

    match request.mode {
        StagingMode::Copy => log::info!("INFO: Copying input files to {}", substack_slice_dir.display()),
        StagingMode::Symlink => log::info!("INFO: Creating symlinks in {}", substack_slice_dir.display()),
    }
    let placed = slices.renumber(request.start, request.stop, &substack_slice_dir, request.mode)?;

    log::info!("SUCCESS: {} slices placed in {} ({})", placed, substack_name, request.mode);

    Ok(substack_base_dir)
}

/// The template root must be named after the substack; checked
/// before anything is rendered.
fn check_template(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !config.template_dir.is_dir() {
        return Err(format!(
            "ERROR: Template directory doesn't exist: {}",
            config.template_dir.display()
        )
        .into());
    }

    let root = config.template_root();
    if !root.is_dir() {
        return Err(format!(
            "ERROR: Template doesn't exist or has the wrong name: {}",
            root.display()
        )
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_zero_padded() {
        assert_eq!(tab_name(2), "Sec02");
        assert_eq!(tab_name(31), "Sec31");
        assert_eq!(
            default_substack_name("Sec02", 10000, 10100),
            "substack-Sec02-z10000-z10100"
        );
        assert_eq!(default_substack_name("Sec02", 5, 10), "substack-Sec02-z00005-z00010");
    }

    #[test]
    fn default_slice_dir_comes_from_config() {
        let request = PrepareRequest {
            fly: DEFAULT_FLY.into(),
            region: DEFAULT_REGION.into(),
            slab: 2,
            start: 0,
            stop: 10,
            input_slice_dir: None,
            substack_name: None,
            parent_output_dir: PathBuf::from("."),
            mode: StagingMode::default(),
        };

        assert_eq!(
            request.input_slice_dir(&Config::default()),
            PathBuf::from("/nrs/flyem/alignment/Z1217-19m/VNC/Sec02/zcorr")
        );
        assert_eq!(request.substack_name(), "substack-Sec02-z00000-z00010");
    }

    #[test]
    fn missing_template_fails_before_creating_anything() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            template_dir: tmp.path().join("no-template"),
            ..Config::default()
        };
        let request = PrepareRequest {
            fly: DEFAULT_FLY.into(),
            region: DEFAULT_REGION.into(),
            slab: 2,
            start: 0,
            stop: 10,
            input_slice_dir: Some(tmp.path().to_path_buf()),
            substack_name: Some("s1".into()),
            parent_output_dir: tmp.path().join("out"),
            mode: StagingMode::Symlink,
        };

        assert!(prepare(&request, &config).is_err());
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn misnamed_template_root_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("template/{{name}}")).unwrap();
        let config = Config {
            template_dir: tmp.path().join("template"),
            ..Config::default()
        };

        let err = check_template(&config).unwrap_err();
        assert!(err.to_string().contains("wrong name"));
    }

    #[test]
    fn template_with_logs_dir_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("template/{{substack_name}}/logs")).unwrap();
        fs::write(tmp.path().join("z10.png"), b"10").unwrap();
        let config = Config {
            template_dir: tmp.path().join("template"),
            ..Config::default()
        };
        let request = PrepareRequest {
            fly: DEFAULT_FLY.into(),
            region: DEFAULT_REGION.into(),
            slab: 2,
            start: 10,
            stop: 11,
            input_slice_dir: Some(tmp.path().to_path_buf()),
            substack_name: Some("s1".into()),
            parent_output_dir: tmp.path().join("out"),
            mode: StagingMode::Symlink,
        };

        let msg = prepare(&request, &config).unwrap_err().to_string();
        assert!(msg.contains("Could not create"));
        assert!(msg.contains(LOGS));
    }
}
