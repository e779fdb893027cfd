//! Environment scrubbing.
//!
//! Child processes see exactly `PATH`, `HOME`, and the adapter's declared
//! safe additions. Nothing else from the host leaks through, so tools
//! cannot read user rc-files or pick up stray interpreter paths — part of
//! the kernel's determinism contract.

/// Host variables that always pass through.
const PASSTHROUGH: &[&str] = &["PATH", "HOME"];

/// Build the scrubbed child environment.
///
/// `additions` override passthrough values on key collision.
pub fn scrubbed_env(additions: &[(String, String)]) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = Vec::with_capacity(PASSTHROUGH.len() + additions.len());

    for key in PASSTHROUGH {
        if additions.iter().any(|(k, _)| k == key) {
            continue;
        }
        if let Ok(value) = std::env::var(key) {
            env.push((key.to_string(), value));
        }
    }

    env.extend(additions.iter().cloned());
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_whitelisted_vars_present() {
        let env = scrubbed_env(&[("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string())]);
        for (key, _) in &env {
            assert!(
                key == "PATH" || key == "HOME" || key == "PYTHONDONTWRITEBYTECODE",
                "unexpected env var {key}"
            );
        }
    }

    #[test]
    fn additions_override_passthrough() {
        let env = scrubbed_env(&[("PATH".to_string(), "/usr/bin".to_string())]);
        let paths: Vec<_> = env.iter().filter(|(k, _)| k == "PATH").collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].1, "/usr/bin");
    }
}
