use std::process::Command;

/// Captured result of an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Quotes a word for `sh`, leaving it bare when no quoting is needed.
///
/// # Example
///
/// ```rust, no_run
/// # use substack::executor::quote;
/// assert_eq!(quote("/data/s1"), "/data/s1");
/// assert_eq!(quote("/data/my s1"), "'/data/my s1'");
/// ```
pub fn quote(word: &str) -> String {
    let bare = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_/.,:=@%+-".contains(c));

    if bare {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Executes a shell command and captures its output.
///
/// # Arguments
///
/// * `cmd` - The shell command to execute.
///
/// # Returns
///
/// The captured output, or an error if `sh` could not be spawned.
///
/// # Example
///
/// ```rust, no_run
/// # use substack::executor::shell;
/// let output = shell("ls -l").unwrap();
///
/// assert!(output.success());
/// ```
pub fn shell(cmd: &str) -> std::io::Result<ShellOutput> {
    log::debug!("DEBUG: sh -c {}", cmd);

    let output = Command::new("sh").arg("-c").arg(cmd).output()?;

    Ok(ShellOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Executes a shell command and fails on non-zero exit.
///
/// # Arguments
///
/// * `cmd` - The shell command to execute.
/// * `tool` - The name of the tool being executed, used in messages.
///
/// # Example
///
/// ```rust, no_run
/// # use substack::executor::shell_checked;
/// shell_checked("chmod -R g+w /tmp/substack", "chmod").unwrap();
/// ```
pub fn shell_checked(cmd: &str, tool: &str) -> Result<ShellOutput, Box<dyn std::error::Error>> {
    let output =
        shell(cmd).map_err(|e| format!("ERROR: Failed to execute {}: {}", tool, e))?;

    if !output.success() {
        let code = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        return Err(format!(
            "ERROR: failed to execute {} (exit {})\n{}\n{}",
            tool,
            code,
            cmd,
            output.combined().trim_end()
        )
        .into());
    }

    log::debug!("DEBUG [{}]: {}", tool, output.stdout.trim_end());

    Ok(output)
}
