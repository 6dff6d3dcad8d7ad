use regex::Regex;

use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::consts::*;
use crate::executor::manager::quote;

/// Struct to represent a batch-queue submission
/// built flag by flag.
///
/// # Example
///
/// ```rust, no_run
/// use substack::executor::job::Submission;
///
/// let job = Submission::new("bsub")
///     .slots(1)
///     .name("flatten_substack-Sec02-z10000-z10010")
///     .project("flyem");
///
/// assert_eq!(job.cmd(), "bsub -n 1 -J flatten_substack-Sec02-z10000-z10010 -P flyem");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub args: Vec<String>,
}

impl Submission {
    /// Create a new submission for the given submit executable
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// # use substack::executor::Submission;
    /// let job = Submission::new("bsub");
    ///
    /// assert_eq!(job.cmd(), "bsub");
    /// ```
    pub fn new(submit_command: &str) -> Self {
        Self {
            args: vec![quote(submit_command)],
        }
    }

    /// Add a raw flag to the submission
    pub fn arg<S: ToString>(mut self, arg: S) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Number of job slots
    pub fn slots(self, n: usize) -> Self {
        self.arg(format!("-n {}", n))
    }

    /// Job name
    pub fn name(self, name: &str) -> Self {
        self.arg(format!("-J {}", quote(name)))
    }

    /// Run the job with this single environment variable only,
    /// instead of inheriting the caller's environment
    pub fn env(self, key: &str, value: &str) -> Self {
        self.arg(format!("-env {}", quote(&format!("{}={}", key, value))))
    }

    /// Bill to this project
    pub fn project(self, project: &str) -> Self {
        self.arg(format!("-P {}", quote(project)))
    }

    /// Job group
    pub fn group(self, group: &str) -> Self {
        self.arg(format!("-g {}", quote(group)))
    }

    /// Write job output to a log file
    pub fn output(self, log: &Path) -> Self {
        self.arg(format!("-o {}", quote(&log.display().to_string())))
    }

    /// Email `user` when the job finishes and when it starts.
    ///
    /// `-N` is needed because `-u` is ignored when `-o` is present.
    pub fn notify(self, user: &str) -> Self {
        self.arg(format!("-u {}", quote(user))).arg("-N").arg("-B")
    }

    /// Command the job executes
    pub fn command(self, program: &Path, args: &[&str]) -> Self {
        let mut cmd = quote(&program.display().to_string());
        for arg in args {
            cmd.push(' ');
            cmd.push_str(&quote(arg));
        }

        self.arg(cmd)
    }

    /// Single-line shell command
    pub fn cmd(&self) -> String {
        self.args.join(" ")
    }

    /// Multi-line rendering, one flag per line
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// # use substack::executor::Submission;
    /// let job = Submission::new("bsub").slots(1);
    ///
    /// assert_eq!(job.pretty(), "bsub \\\n  -n 1");
    /// ```
    pub fn pretty(&self) -> String {
        self.args.join(" \\\n  ")
    }
}

/// Builds the flatten submission for a substack
///
/// # Arguments
///
/// * `submit_command` - Batch-queue submission executable.
/// * `substack_name` - Name of the substack, used for the job name.
/// * `tab_name` - Slab identifier, used for the job group.
/// * `bill_to` - Billing project.
/// * `flatten_script` - External flatten script.
/// * `param_path` - Parameter script handed to the flatten script.
/// * `log_path` - Job log file.
/// * `email_to` - Optional notification recipient.
#[allow(clippy::too_many_arguments)]
pub fn flatten_submission(
    submit_command: &str,
    substack_name: &str,
    tab_name: &str,
    bill_to: &str,
    flatten_script: &Path,
    param_path: &Path,
    log_path: &Path,
    email_to: Option<&str>,
) -> Submission {
    let param_path = param_path.display().to_string();

    let mut job = Submission::new(submit_command)
        .slots(1)
        .name(&format!("{}_{}", JOB_PREFIX, substack_name))
        .env(PARAM_PATH, &param_path)
        .project(bill_to)
        .group(&format!("/{}/{}/{}", bill_to, FLATTEN, tab_name))
        .output(log_path);

    if let Some(user) = email_to {
        job = job.notify(user);
    }

    job.command(flatten_script, &[&param_path])
}

/// A job accepted by the batch queue.
///
/// Parsed from the submit command's reply, e.g.
/// `Job <774133> is submitted to queue <spark>.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    pub queue: String,
}

fn bracketed() -> &'static Regex {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    FIELD.get_or_init(|| Regex::new(r"<([^<>]*)>").expect("valid bracket pattern"))
}

impl FromStr for SubmittedJob {
    type Err = String;

    /// Parse the submission reply.
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// # use substack::executor::SubmittedJob;
    /// let job: SubmittedJob = "Job <774133> is submitted to queue <spark>.\n".parse().unwrap();
    ///
    /// assert_eq!(job.job_id, "774133");
    /// assert_eq!(job.queue, "spark");
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = bracketed()
            .captures_iter(s)
            .map(|c| c[1].to_string())
            .collect::<Vec<_>>();

        let [job_id, queue] = fields.as_slice() else {
            return Err(format!(
                "ERROR: Expected exactly two <...> fields in submission output, found {}: {}",
                fields.len(),
                s.trim_end()
            ));
        };

        if job_id.is_empty() || !job_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("ERROR: Job id is not numeric: <{}>", job_id));
        }
        if queue.is_empty() || !queue.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!("ERROR: Queue name is not a single word: <{}>", queue));
        }

        Ok(Self {
            job_id: job_id.clone(),
            queue: queue.clone(),
        })
    }
}
