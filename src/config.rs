use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::consts::*;

/// A struct representing the deployment configuration.
///
/// Every field has a default, so a config file only needs
/// to name the values that differ from the FlyEM deployment.
///
/// # Fields
///
/// * `flatten_script` - External script run by the cluster job.
/// * `slice_dir_pattern` - Pattern for the default input slice directory.
/// * `bill_to` - Billing project for cluster jobs.
/// * `service_account` - User expected to launch jobs.
/// * `submit_command` - Batch-queue submission executable.
/// * `template_dir` - Directory holding the substack template.
///
/// # Example
///
/// ``` toml
/// bill_to = "flyem"
/// submit_command = "bsub"
/// slice_dir_pattern = "/nrs/flyem/alignment/{fly}/{region}/{tab_name}/zcorr"
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub flatten_script: PathBuf,
    pub slice_dir_pattern: String,
    pub bill_to: String,
    pub service_account: String,
    pub submit_command: String,
    pub template_dir: PathBuf,
}

impl Config {
    /// Read a configuration file and return a Config struct.
    ///
    /// # Arguments
    ///
    /// * `config` - A path to a TOML configuration file.
    ///
    /// # Returns
    ///
    /// A Result containing a Config struct or an error.
    ///
    /// # Example
    ///
    /// ``` rust, no_run
    /// # use substack::config::Config;
    /// let config = Config::read("flatten.toml").unwrap();
    /// ```
    pub fn read<P: AsRef<Path>>(config: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config.as_ref();
        let mut file = File::open(config).map_err(|e| {
            format!(
                "ERROR: Could not open config file {}: {}",
                config.display(),
                e
            )
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Read the given config file or fall back to the defaults.
    pub fn load(config: Option<&PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        match config {
            Some(path) => {
                log::info!("INFO: Reading configuration from {}", path.display());
                Self::read(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Expand the default input slice directory for a slab.
    ///
    /// # Example
    ///
    /// ``` rust, no_run
    /// # use std::path::PathBuf;
    /// # use substack::config::Config;
    /// let config = Config::default();
    /// let dir = config.slice_dir("Z1217-19m", "VNC", "Sec02");
    ///
    /// assert_eq!(dir, PathBuf::from("/nrs/flyem/alignment/Z1217-19m/VNC/Sec02/zcorr"));
    /// ```
    pub fn slice_dir(&self, fly: &str, region: &str, tab_name: &str) -> PathBuf {
        PathBuf::from(
            self.slice_dir_pattern
                .replace(&format!("{{{}}}", FLY), fly)
                .replace(&format!("{{{}}}", REGION), region)
                .replace(&format!("{{{}}}", TAB_NAME), tab_name),
        )
    }

    /// Path of the top-level template directory, whose
    /// name must render to the substack name.
    pub fn template_root(&self) -> PathBuf {
        self.template_dir.join(TEMPLATE_ROOT_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flatten_script: PathBuf::from(DEFAULT_FLATTEN_SCRIPT),
            slice_dir_pattern: DEFAULT_SLICE_DIR_PATTERN.to_string(),
            bill_to: DEFAULT_BILL_TO.to_string(),
            service_account: DEFAULT_SERVICE_ACCOUNT.to_string(),
            submit_command: DEFAULT_SUBMIT_COMMAND.to_string(),
            template_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join(TEMPLATES)
                .join(SUBSTACK_TEMPLATE),
        }
    }
}

/// Parameters of a materialized substack, persisted as
/// `substack-params.json` at the substack root.
///
/// Written once by the preparer and only read afterwards.
/// The same record is the context handed to the template renderer.
///
/// # Example
///
/// ``` json
/// {
///   "substack_name": "substack-Sec02-z10000-z10100",
///   "substack_base_dir": "/scratch/substack-Sec02-z10000-z10100",
///   "substack_slice_dir": "/scratch/substack-Sec02-z10000-z10100/input_slices",
///   "fly": "Z1217-19m",
///   "tab_name": "Sec02",
///   "bill_to": "flyem"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubstackParams {
    pub substack_name: String,
    pub substack_base_dir: String,
    pub substack_slice_dir: String,
    pub fly: String,
    pub tab_name: String,
    pub bill_to: String,
}

impl SubstackParams {
    /// Build the record for a substack rooted at `substack_base_dir`.
    ///
    /// # Arguments
    ///
    /// * `substack_name` - Name of the substack (and of its directory).
    /// * `substack_base_dir` - Absolute path of the substack directory.
    /// * `fly` - Fly identifier.
    /// * `tab_name` - Slab identifier, e.g. `Sec02`.
    /// * `bill_to` - Billing project for cluster jobs.
    ///
    /// # Returns
    ///
    /// The record, or an error if an identifier is empty.
    pub fn new(
        substack_name: &str,
        substack_base_dir: &Path,
        fly: &str,
        tab_name: &str,
        bill_to: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        for (key, value) in [
            (SUBSTACK_NAME, substack_name),
            (FLY, fly),
            (TAB_NAME, tab_name),
            (BILL_TO, bill_to),
        ] {
            if value.is_empty() {
                return Err(format!("ERROR: {} must not be empty!", key).into());
            }
        }

        let substack_base_dir = path_to_string(substack_base_dir)?;
        let substack_slice_dir = path_to_string(&Path::new(&substack_base_dir).join(INPUT_SLICES))?;

        Ok(Self {
            substack_name: substack_name.to_string(),
            substack_base_dir,
            substack_slice_dir,
            fly: fly.to_string(),
            tab_name: tab_name.to_string(),
            bill_to: bill_to.to_string(),
        })
    }

    /// Read `substack-params.json` from a substack directory.
    pub fn read(substack_base_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let path = substack_base_dir.join(PARAMS_FILE);
        let file = File::open(&path)
            .map_err(|e| format!("ERROR: Could not open {}: {}", path.display(), e))?;

        serde_json::from_reader(file)
            .map_err(|e| format!("ERROR: Could not parse {}: {}", path.display(), e).into())
    }

    /// Write `substack-params.json` into the substack directory.
    /// An existing file is never overwritten.
    pub fn write(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Path::new(&self.substack_base_dir).join(PARAMS_FILE);
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| format!("ERROR: Could not create {}: {}", path.display(), e))?;

        serde_json::to_writer(file, self)?;

        Ok(path)
    }

    /// Flatten the record into the key-value context used by the renderer.
    ///
    /// # Example
    ///
    /// ``` rust, no_run
    /// # use std::path::Path;
    /// # use substack::config::SubstackParams;
    /// # let params = SubstackParams::new("s1", Path::new("/tmp/s1"), "Z1217-19m", "Sec02", "flyem").unwrap();
    /// let context = params.context();
    ///
    /// assert_eq!(context["tab_name"], "Sec02");
    /// ```
    pub fn context(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (SUBSTACK_NAME.to_string(), self.substack_name.clone()),
            (SUBSTACK_BASE_DIR.to_string(), self.substack_base_dir.clone()),
            (SUBSTACK_SLICE_DIR.to_string(), self.substack_slice_dir.clone()),
            (FLY.to_string(), self.fly.clone()),
            (TAB_NAME.to_string(), self.tab_name.clone()),
            (BILL_TO.to_string(), self.bill_to.clone()),
        ])
    }
}

fn path_to_string(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| format!("ERROR: path is not valid UTF-8: {}", path.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slice_dir_expands_every_placeholder() {
        let config = Config::default();

        assert_eq!(
            config.slice_dir("Z1217-19m", "VNC", "Sec02"),
            PathBuf::from("/nrs/flyem/alignment/Z1217-19m/VNC/Sec02/zcorr")
        );
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str("bill_to = \"lab\"\nsubmit_command = \"echo\"\n").unwrap();

        assert_eq!(config.bill_to, "lab");
        assert_eq!(config.submit_command, "echo");
        assert_eq!(config.service_account, DEFAULT_SERVICE_ACCOUNT);
        assert_eq!(config.flatten_script, PathBuf::from(DEFAULT_FLATTEN_SCRIPT));
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        assert!(toml::from_str::<Config>("billing = \"lab\"\n").is_err());
    }

    #[test]
    fn params_reject_empty_identifiers() {
        let base = Path::new("/tmp/substack-Sec02-z00000-z00010");

        assert!(SubstackParams::new("", base, "Z1217-19m", "Sec02", "flyem").is_err());
        assert!(SubstackParams::new("s", base, "Z1217-19m", "Sec02", "").is_err());
    }

    #[test]
    fn params_json_uses_flat_string_keys() {
        let params = SubstackParams::new(
            "substack-Sec02-z00000-z00010",
            Path::new("/tmp/substack-Sec02-z00000-z00010"),
            "Z1217-19m",
            "Sec02",
            "flyem",
        )
        .unwrap();

        let value = serde_json::to_value(&params).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 6);
        assert_eq!(
            object["substack_slice_dir"],
            "/tmp/substack-Sec02-z00000-z00010/input_slices"
        );
        assert_eq!(
            serde_json::from_value::<SubstackParams>(value).unwrap(),
            params
        );
        assert_eq!(params.context()["substack_base_dir"], params.substack_base_dir);
    }
}
