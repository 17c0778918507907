use crate::config::{Credential, RegistryConfig};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Load the user `.npmrc` and then the project `.npmrc` in `project_dir`,
/// later files overriding earlier ones. Missing files are skipped.
pub fn load(project_dir: &Path) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::default();
    let files: Vec<PathBuf> = dirs::home_dir()
        .map(|home| home.join(".npmrc"))
        .into_iter()
        .chain(std::iter::once(project_dir.join(".npmrc")))
        .collect();

    for path in files {
        if !path.is_file() {
            continue;
        }
        tracing::debug!(path = %path.display(), "reading npmrc");
        let text = fs::read_to_string(&path)?;
        apply(&mut config, &text, |var| std::env::var(var).ok());
    }

    Ok(config)
}

/// Apply the registry-related settings in `text` to `config`.
///
/// Recognized keys: `registry`, `@scope:registry`,
/// `//host/path/:_authToken`, `//host/path/:_auth`. Everything else is
/// ignored.
pub fn apply<F>(config: &mut RegistryConfig, text: &str, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = expand_env(unquote(value.trim()), &env);

        if key == "registry" {
            config.set_default_registry(&value);
        } else if let Some(scope) = key
            .strip_suffix(":registry")
            .filter(|scope| scope.starts_with('@'))
        {
            config.set_scope_registry(scope, &value);
        } else if key.starts_with("//") {
            match key.rsplit_once(':') {
                Some((prefix, "_authToken")) => {
                    config.set_credential(prefix, Credential::Bearer(value));
                }
                Some((prefix, "_auth")) => {
                    config.set_credential(prefix, Credential::Basic(value));
                }
                _ => {}
            }
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Replace `${VAR}` references; unknown variables are left as written
fn expand_env<F>(value: &str, env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        match env(var) {
            Some(val) => out.push_str(&val),
            None => {
                tracing::warn!(var, "environment variable referenced in .npmrc is not set");
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
