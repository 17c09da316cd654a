//! Shell-style expansion of path settings.
//!
//! Path fields accept `~` for the home directory and `$VAR`, `${VAR}` or
//! `${VAR:-default}` environment references. A reference to an unset or
//! non-unicode variable without a default is an error naming the field.

use std::borrow::Cow;
use std::env::VarError;

use crate::ConfigError;

/// Expand a path setting in place; `None` stays `None`.
pub(crate) fn expand_path(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_deref() {
        if let Cow::Owned(expanded) = expand(raw, field)? {
            *value = Some(expanded);
        }
    }
    Ok(())
}

fn expand<'a>(raw: &'a str, field: &str) -> Result<Cow<'a, str>, ConfigError> {
    if !raw.contains('$') && !raw.starts_with('~') {
        return Ok(Cow::Borrowed(raw));
    }

    shellexpand::full_with_context(
        raw,
        || std::env::var("HOME").ok(),
        |name| std::env::var(name).map(Some),
    )
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: match e.cause {
            VarError::NotPresent => format!("${{{}}} not set", e.var_name),
            VarError::NotUnicode(_) => format!("${{{}}} is not valid unicode", e.var_name),
        },
    })
}
