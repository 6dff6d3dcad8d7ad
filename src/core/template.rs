use regex::{Captures, Regex};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder pattern")
    })
}

/// Substitute every `{{ key }}` in `text` from `context`.
///
/// # Arguments
///
/// * `text` - Template text.
/// * `context` - Values for the placeholders.
///
/// # Returns
///
/// The rendered text, or an error naming the first unknown key.
///
/// # Example
///
/// ```rust, no_run
/// # use std::collections::BTreeMap;
/// # use substack::core::template::render_str;
/// let context = BTreeMap::from([("tab_name".to_string(), "Sec02".to_string())]);
///
/// assert_eq!(render_str("tab={{ tab_name }}", &context).unwrap(), "tab=Sec02");
/// ```
pub fn render_str(
    text: &str,
    context: &BTreeMap<String, String>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut missing = None;

    let rendered = placeholder().replace_all(text, |caps: &Captures| match context.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });

    match missing {
        Some(key) => Err(format!("ERROR: Template key '{}' has no value in context!", key).into()),
        None => Ok(rendered.into_owned()),
    }
}

/// Renders a template directory into `output_dir`.
///
/// `template_dir` must contain exactly one top-level directory. Its name,
/// every path below it and the body of every UTF-8 file are rendered with
/// [`render_str`]. Other files are copied untouched. File permissions
/// are kept, so rendered shell scripts stay executable.
///
/// # Arguments
///
/// * `template_dir` - Directory holding the template.
/// * `context` - Values for the placeholders.
/// * `output_dir` - Directory the rendered tree is created in.
///
/// # Returns
///
/// The path of the rendered top-level directory. Fails if it already exists.
///
/// # Example
///
/// ```rust, no_run
/// # use std::path::Path;
/// # use substack::config::SubstackParams;
/// # use substack::core::template::render;
/// # let params = SubstackParams::new("s1", Path::new("/tmp/s1"), "Z1217-19m", "Sec02", "flyem").unwrap();
/// let root = render(Path::new("templates/substack"), &params.context(), Path::new(".")).unwrap();
/// ```
pub fn render(
    template_dir: &Path,
    context: &BTreeMap<String, String>,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let template_root = single_root(template_dir)?;
    let root_name = render_str(
        &template_root
            .file_name()
            .ok_or("ERROR: template root has no name")?
            .to_string_lossy(),
        context,
    )?;

    let rendered_root = output_dir.join(&root_name);

    // INFO: create_dir (not create_dir_all) so an existing substack is never reused
    fs::create_dir_all(output_dir)?;
    fs::create_dir(&rendered_root).map_err(|e| {
        format!(
            "ERROR: Could not create {}: {}",
            rendered_root.display(),
            e
        )
    })?;

    for entry in WalkDir::new(&template_root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(&template_root)?;
        let target = rendered_root.join(render_str(&relative.to_string_lossy(), context)?);

        if entry.file_type().is_dir() {
            fs::create_dir(&target)?;
            continue;
        }

        match fs::read_to_string(entry.path()) {
            Ok(body) => fs::write(&target, render_str(&body, context)?)?,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                fs::copy(entry.path(), &target)?;
            }
            Err(e) => return Err(e.into()),
        }

        fs::set_permissions(&target, entry.metadata()?.permissions())?;
        log::debug!("DEBUG: rendered {}", target.display());
    }

    Ok(rendered_root)
}

fn single_root(template_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let entries = fs::read_dir(template_dir)
        .and_then(|dir| dir.collect::<Result<Vec<_>, _>>())
        .map_err(|e| format!("ERROR: Could not read template {}: {}", template_dir.display(), e))?;

    let mut roots = Vec::new();
    for entry in entries {
        if entry.file_type()?.is_dir() {
            roots.push(entry.path());
        }
    }

    match roots.as_slice() {
        [root] => Ok(root.clone()),
        _ => Err(format!(
            "ERROR: Template {} must contain exactly one top-level directory, found {}",
            template_dir.display(),
            roots.len()
        )
        .into()),
    }
}
