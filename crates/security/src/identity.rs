//! Identity resolution.

use tracing::warn;

use crate::error::{SecurityError, SecurityResult};

/// Current-user variable per host OS. Hosts not listed use [`DEFAULT_USER_ENV_VAR`].
const USER_ENV_VARS: &[(&str, &str)] = &[("windows", "USERNAME")];

/// Current-user variable on every host not listed in [`USER_ENV_VARS`].
pub const DEFAULT_USER_ENV_VAR: &str = "USER";

/// Name of the variable holding the current user on the given OS
/// (as reported by `std::env::consts::OS`).
pub fn user_env_var_for(os: &str) -> &'static str {
    USER_ENV_VARS
        .iter()
        .find(|(name, _)| *name == os)
        .map(|(_, var)| *var)
        .unwrap_or(DEFAULT_USER_ENV_VAR)
}

/// Name of the variable holding the current user on this host.
pub fn user_env_var() -> &'static str {
    user_env_var_for(std::env::consts::OS)
}

/// Looks a variable up in the process environment.
///
/// A variable that is set counts as present even when it is not valid
/// UTF-8; its value is converted lossily.
pub fn process_env(name: &str) -> Option<String> {
    let value = std::env::var_os(name)?;
    Some(value.into_string().unwrap_or_else(|raw| {
        warn!(var = name, "Environment variable is not valid UTF-8, converting lossily");
        raw.to_string_lossy().into_owned()
    }))
}

/// Resolve the acting identity.
///
/// An explicit identity is used verbatim. Without one, clients fall back to
/// the current-user variable and fail when it is unset. Server initiated
/// processes get an empty identity here; [`crate::SecurityBuilder::build`]
/// rejects it unless a later step supplies one.
pub fn resolve_identity<E>(explicit: &str, initiated_by_server: bool, env: E) -> SecurityResult<String>
where
    E: Fn(&str) -> Option<String>,
{
    if !explicit.is_empty() {
        return Ok(explicit.to_string());
    }

    if initiated_by_server {
        return Ok(String::new());
    }

    let var = user_env_var();
    env(var).ok_or(SecurityError::IdentityUnresolved { var })
}
