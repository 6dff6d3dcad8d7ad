use clap::Parser;
use std::path::PathBuf;

use crate::consts::*;
use crate::core::{prepare::PrepareRequest, slices::StagingMode};

/// Prepare a substack directory for flattening
///
/// The flattening scripts process an entire tab at a time, e.g. every
/// PNG in /nrs/flyem/alignment/Z1217-19m/VNC/Sec02/zcorr/. To flatten
/// only some of the slices, this extracts them into a new directory,
/// renumbered from 0, next to a parameter file and the flatten scripts.
///
/// # Example
///
/// ```bash,no_run
/// prepare_substack_dir 2 10000 10100
/// ```
///
/// # Arguments
///
/// * `slab` - Slab (tab) number
/// * `start` - First slice to include
/// * `stop` - One beyond the last slice to include
/// * `fly` - Fly identifier
/// * `region` - Region of the fly
/// * `input_slice_dir` - Directory holding the slab's slices
/// * `substack_name` - Name of the substack directory
/// * `parent_output_dir` - Where the substack directory is created
/// * `copy_input` - Copy slices instead of symlinking them
/// * `config` - Optional deployment config (TOML)
#[derive(Debug, Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct PrepareArgs {
    #[arg(help = "Slab (tab) number, e.g. 2 for Sec02", value_name = "SLAB")]
    pub slab: u32,

    #[arg(help = "First slice index to process", value_name = "START")]
    pub start: u64,

    #[arg(help = "One-beyond the last slice to process", value_name = "STOP")]
    pub stop: u64,

    #[arg(
        long = "fly",
        help = "Fly identifier",
        value_name = "FLY",
        default_value = DEFAULT_FLY
    )]
    pub fly: String,

    #[arg(
        long = "region",
        help = "Region of the fly",
        value_name = "REGION",
        default_value = DEFAULT_REGION
    )]
    pub region: String,

    #[arg(
        short = 'd',
        long = "input-slice-dir",
        help = "Directory of input slices [default: from config slice_dir_pattern]",
        value_name = "DIR"
    )]
    pub input_slice_dir: Option<PathBuf>,

    #[arg(
        short = 'n',
        long = "substack-name",
        help = "Substack name [default: substack-SecNN-zSTART-zSTOP]",
        value_name = "NAME"
    )]
    pub substack_name: Option<String>,

    #[arg(
        short = 'o',
        long = "parent-output-dir",
        help = "Directory in which the substack directory is created",
        value_name = "DIR",
        default_value = DEFAULT_PARENT_DIR
    )]
    pub parent_output_dir: PathBuf,

    #[arg(
        short = 'c',
        long = "copy-input",
        help = "Copy the input slices into the substack directory instead of symlinking them"
    )]
    pub copy_input: bool,

    #[arg(long = "config", help = "Path to a deployment config file", value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

impl PrepareArgs {
    pub fn check(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.start >= self.stop {
            return Err(format!(
                "ERROR: START ({}) must be less than STOP ({})",
                self.start, self.stop
            )
            .into());
        }

        Ok(())
    }

    pub fn request(&self) -> PrepareRequest {
        PrepareRequest {
            fly: self.fly.clone(),
            region: self.region.clone(),
            slab: self.slab,
            start: self.start,
            stop: self.stop,
            input_slice_dir: self.input_slice_dir.clone(),
            substack_name: self.substack_name.clone(),
            parent_output_dir: self.parent_output_dir.clone(),
            mode: StagingMode::from_copy_flag(self.copy_input),
        }
    }
}

/// Launch a flatten job on the LSF cluster for a prepared substack
///
/// # Example
///
/// ```bash,no_run
/// prepare_substack_dir 2 10000 10010
/// launch_flatten --email-to bergs substack-Sec02-z10000-z10010
/// ```
#[derive(Debug, Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct LaunchArgs {
    #[arg(
        help = "Substack directory created by prepare_substack_dir",
        value_name = "SUBSTACK_BASE_DIR"
    )]
    pub substack_base_dir: PathBuf,

    #[arg(
        short = 'e',
        long = "email-to",
        help = "Send email to this user when the job starts and finishes",
        value_name = "USER"
    )]
    pub email_to: Option<String>,

    #[arg(long = "config", help = "Path to a deployment config file", value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_args_defaults() {
        let args = PrepareArgs::try_parse_from(["prepare_substack_dir", "2", "10000", "10100"]).unwrap();

        assert_eq!(args.fly, DEFAULT_FLY);
        assert_eq!(args.region, DEFAULT_REGION);
        assert_eq!(args.parent_output_dir, PathBuf::from("."));
        assert!(!args.copy_input);
        assert_eq!(args.request().mode, StagingMode::Symlink);
        assert!(args.check().is_ok());
    }

    #[test]
    fn prepare_args_short_flags() {
        let args = PrepareArgs::try_parse_from([
            "prepare_substack_dir",
            "-c",
            "-d",
            "/slices",
            "-n",
            "mine",
            "-o",
            "/out",
            "3",
            "0",
            "10",
        ])
        .unwrap();

        let request = args.request();
        assert_eq!(request.mode, StagingMode::Copy);
        assert_eq!(request.input_slice_dir, Some(PathBuf::from("/slices")));
        assert_eq!(request.substack_name(), "mine");
        assert_eq!(request.tab_name(), "Sec03");
    }

    #[test]
    fn prepare_args_reject_bad_range() {
        let args = PrepareArgs::try_parse_from(["prepare_substack_dir", "2", "10", "10"]).unwrap();
        assert!(args.check().is_err());

        assert!(PrepareArgs::try_parse_from(["prepare_substack_dir", "2", "-1", "10"]).is_err());
    }

    #[test]
    fn launch_args_email() {
        let args = LaunchArgs::try_parse_from(["launch_flatten", "-e", "bergs", "s1"]).unwrap();

        assert_eq!(args.email_to.as_deref(), Some("bergs"));
        assert_eq!(args.substack_base_dir, PathBuf::from("s1"));
    }
}
