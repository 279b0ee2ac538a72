//! API key resolution for the LLM service.
//!
//! A key can come from three places, checked in this order:
//!
//! 1. **Inline value** in the config file (`llm.api_key`), handy for a quick local run
//! 2. **Key file** (`llm.api_key_file`), e.g. a mounted Docker secret
//! 3. **Environment variable** (`llm.api_key_env`, `GROQ_API_KEY` by default)

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API key configured (set llm.api_key, llm.api_key_file or an environment variable)")]
    NoSourceProvided,

    #[error("Failed to read API key from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API key file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Where to look for a secret. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct SecretSource<'a> {
    pub value: Option<&'a str>,
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.is_empty())
}

impl SecretSource<'_> {
    /// Resolves the secret from the first source that is set.
    ///
    /// Only the first configured source is consulted: a missing key file is an
    /// error even when the environment variable would have worked.
    pub fn resolve(&self) -> Result<SecretString, SecretError> {
        if let Some(value) = present(self.value) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = present(self.file) {
            let expanded = expand_home(path);
            let content =
                std::fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
                    path: expanded.clone(),
                    source: e,
                })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile { path: expanded });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }

        if let Some(name) = present(self.env_var) {
            return match std::env::var(name) {
                // Trailing newlines are common when keys are exported from files.
                Ok(value) if !value.trim().is_empty() => {
                    Ok(SecretString::from(value.trim().to_string()))
                }
                Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// Checks HOME, then USERPROFILE. `~user/...` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
