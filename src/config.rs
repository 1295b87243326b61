//! Driver configuration shared by the binary: env flags and form discovery.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

pub const FORM_FILE: &str = "chi-form.yaml";
pub const CONFIG_DIR_VAR: &str = "CHI_INPUT_CONFIG_DIR";

pub fn truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}

/// `1`, `true` or `yes` in the named variable; anything else is off.
pub fn env_flag(var: &str) -> bool {
    std::env::var(var).ok().map(|v| truthy(&v)).unwrap_or(false)
}

/// Where the form declaration lives.
///
/// An explicit path wins. Otherwise `chi-form.yaml` is looked up in the
/// config dir, then in `cwd`, then in `cwd/.tui`, then in `.tui` of each
/// ancestor of `cwd`.
pub fn find_form(explicit: Option<&Path>, config_dir: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(p) = explicit {
        let full = if p.is_absolute() {
            p.to_path_buf()
        } else if let Some(dir) = config_dir {
            let anchored = dir.join(p);
            if anchored.exists() {
                anchored
            } else {
                cwd.join(p)
            }
        } else {
            cwd.join(p)
        };
        return Ok(full);
    }

    if let Some(dir) = config_dir {
        let entry = dir.join(FORM_FILE);
        if entry.exists() {
            return Ok(entry);
        }
        return Err(anyhow!("{entry:?} not found ({CONFIG_DIR_VAR} is set)"));
    }

    let candidates = [cwd.join(FORM_FILE), cwd.join(".tui").join(FORM_FILE)];
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }
    let mut cur = cwd;
    while let Some(parent) = cur.parent() {
        let p = parent.join(".tui").join(FORM_FILE);
        if p.exists() {
            return Ok(p);
        }
        cur = parent;
    }
    Err(anyhow!(
        "no form given and no {FORM_FILE} found from {cwd:?}; pass --form or set {CONFIG_DIR_VAR}"
    ))
}

/// [`find_form`] against the process environment and working directory.
pub fn discover_form(explicit: Option<&Path>) -> Result<PathBuf> {
    let config_dir = std::env::var(CONFIG_DIR_VAR).ok().map(PathBuf::from);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_form(explicit, config_dir.as_deref(), &cwd)
}
