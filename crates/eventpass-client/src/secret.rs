//! Secret reference resolver.
//!
//! The access token is never written to `config.toml`. The file may instead
//! point at where the token lives:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`

const PASS_PREFIX: &str = "pass::";
const ENV_PREFIX: &str = "env::";

/// Returns true if `value` uses a supported reference prefix.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(PASS_PREFIX) || value.starts_with(ENV_PREFIX)
}

/// Resolves a secret reference.
///
/// Plain values are rejected so that a literal token pasted into the config
/// file is reported instead of silently used.
pub fn resolve(reference: &str) -> Result<String, String> {
    if let Some(path) = reference.strip_prefix(PASS_PREFIX) {
        resolve_pass(path)
    } else if let Some(var) = reference.strip_prefix(ENV_PREFIX) {
        resolve_env(var)
    } else {
        Err(format!(
            "expected a {}path or {}VAR reference",
            PASS_PREFIX, ENV_PREFIX
        ))
    }
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}
