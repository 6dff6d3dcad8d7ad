// formats
pub const PNG: &str = "png";
pub const TIF: &str = "tif";
pub const SLICE_EXTENSIONS: &[&str] = &[PNG, TIF];
pub const SLICE_INDEX_WIDTH: usize = 5;

// substack layout
pub const PARAMS_FILE: &str = "substack-params.json";
pub const INPUT_SLICES: &str = "input_slices";
pub const LOGS: &str = "logs";
pub const FLATTEN: &str = "flatten";
pub const FLATTEN_PARAMS: &str = "flattenParams.sh";
pub const FLATTEN_LOG: &str = "flatten.log";

// params/context keys
pub const SUBSTACK_NAME: &str = "substack_name";
pub const SUBSTACK_BASE_DIR: &str = "substack_base_dir";
pub const SUBSTACK_SLICE_DIR: &str = "substack_slice_dir";
pub const FLY: &str = "fly";
pub const REGION: &str = "region";
pub const TAB_NAME: &str = "tab_name";
pub const BILL_TO: &str = "bill_to";

// submission
pub const PARAM_PATH: &str = "PARAM_PATH";
pub const JOB_PREFIX: &str = "flatten";

// deployment defaults
pub const DEFAULT_FLY: &str = "Z1217-19m";
pub const DEFAULT_REGION: &str = "VNC";
pub const DEFAULT_PARENT_DIR: &str = ".";
pub const DEFAULT_BILL_TO: &str = "flyem";
pub const DEFAULT_SERVICE_ACCOUNT: &str = "flyem";
pub const DEFAULT_SUBMIT_COMMAND: &str = "bsub";
pub const DEFAULT_SLICE_DIR_PATTERN: &str = "/nrs/flyem/alignment/{fly}/{region}/{tab_name}/zcorr";
pub const DEFAULT_FLATTEN_SCRIPT: &str = "/groups/flyem/data/alignment/facefinder/src/hxadjustheightsurf/share/scripts/clusterLSFFlattenTwoSidesNoWeka.sh";
pub const TEMPLATES: &str = "templates";
pub const SUBSTACK_TEMPLATE: &str = "substack";
pub const TEMPLATE_ROOT_NAME: &str = "{{substack_name}}";

// miscellaneous constants
pub const PROGRESS_EVERY: usize = 1000;
