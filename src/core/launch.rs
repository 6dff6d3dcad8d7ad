use std::path::{Path, PathBuf};

use crate::{
    config::{Config, SubstackParams},
    consts::*,
    core::abspath,
    executor::{job::flatten_submission, shell_checked},
};

/// Parameter script the flatten job is pointed at
pub fn param_script(substack_base_dir: &Path) -> PathBuf {
    substack_base_dir.join(FLATTEN).join(FLATTEN_PARAMS)
}

/// Log file the flatten job writes
pub fn log_path(substack_base_dir: &Path) -> PathBuf {
    substack_base_dir.join(LOGS).join(FLATTEN_LOG)
}

/// Submit a flatten job for a prepared substack.
///
/// # Arguments
///
/// * `substack_base_dir` - Substack directory created by the preparer.
/// * `email_to` - Optional user to notify when the job starts and ends.
/// * `config` - Deployment configuration.
///
/// # Returns
///
/// The raw output of the submit command.
///
/// # Example
///
/// ```rust, no_run
/// # use std::path::Path;
/// # use substack::config::Config;
/// # use substack::core::launch;
/// let output = launch(Path::new("substack-Sec02-z10000-z10010"), Some("bergs"), &Config::default()).unwrap();
/// ```
///
/// # Note
///
/// * Fails without submitting if `substack-params.json` is missing, records
///   a different `substack_base_dir`, or `flatten/flattenParams.sh` is absent.
/// * The recorded `substack_base_dir` must match the resolved path as a
///   string, so a trailing slash in the record is a mismatch.
pub fn launch(
    substack_base_dir: &Path,
    email_to: Option<&str>,
    config: &Config,
) -> Result<String, Box<dyn std::error::Error>> {
    let substack_base_dir = abspath(substack_base_dir)?;
    let params = SubstackParams::read(&substack_base_dir)?;

    if Some(params.substack_base_dir.as_str()) != substack_base_dir.to_str() {
        return Err(format!(
            "ERROR: Mismatch between substack_base_dir from command-line ({}) and from {} ({})",
            substack_base_dir.display(),
            PARAMS_FILE,
            params.substack_base_dir
        )
        .into());
    }

    let param_path = param_script(&substack_base_dir);
    if !param_path.exists() {
        return Err(format!(
            "ERROR: Parameter script does not exist:\n{}",
            param_path.display()
        )
        .into());
    }

    check_user(&config.service_account);

    let job = flatten_submission(
        &config.submit_command,
        &params.substack_name,
        &params.tab_name,
        &params.bill_to,
        &config.flatten_script,
        &param_path,
        &log_path(&substack_base_dir),
        email_to,
    );

    log::info!("INFO: Launching job:\n\n{}\n", job.pretty());

    let output = shell_checked(&job.cmd(), &config.submit_command)?;
    if !output.stderr.trim().is_empty() {
        log::warn!("WARN [{}]: {}", config.submit_command, output.stderr.trim_end());
    }

    Ok(output.stdout)
}

fn check_user(service_account: &str) {
    let user = whoami::username();
    if user != service_account {
        log::warn!(
            "WARN: You aren't running as the '{}' user (you are '{}'). If something doesn't work, try re-running as {}.",
            service_account,
            user,
            service_account
        );
    }
}
