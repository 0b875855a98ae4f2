pub trait EnvVars {
    fn load() -> Self;
    fn get_env_var(&self, key: &str) -> Option<String>;
}

/// Reads `key`, falling back to `default` when unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}
