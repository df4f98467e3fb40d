/// Get environment variable with HOOKWISE_ prefix, falling back to unprefixed version
///
/// Checks `HOOKWISE_{key}` first, then `{key}`, so deployments can use either
/// naming scheme.
///
/// # Examples
///
/// ```rust
/// use hookwise::utils::get_env_with_prefix;
///
/// // Checks HOOKWISE_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("HOOKWISE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a boolean flag from the environment, accepting `1`/`0` alongside `true`/`false`.
pub fn get_env_flag(key: &str) -> Option<bool> {
    get_env_with_prefix(key).and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
