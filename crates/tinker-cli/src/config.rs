//! Startup configuration checks
//!
//! Both credentials are verified eagerly at startup, before any network
//! call; absence is reported with the variable names, not deferred to
//! first use.

/// Environment variables that must be set before the client starts
pub const REQUIRED_KEYS: [&str; 2] = ["ANTHROPIC_API_KEY", "TAVILY_API_KEY"];

/// Names of required credentials missing from the environment
pub fn missing_credentials() -> Vec<&'static str> {
    missing_from(|key| std::env::var(key).ok())
}

fn missing_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| lookup(key).is_none_or(|value| value.is_empty()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_present() {
        let missing = missing_from(|_| Some("secret".into()));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_reports_each_missing_name() {
        let missing = missing_from(|key| {
            (key == "ANTHROPIC_API_KEY").then(|| "secret".to_string())
        });
        assert_eq!(missing, vec!["TAVILY_API_KEY"]);
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let missing = missing_from(|_| Some(String::new()));
        assert_eq!(missing.len(), 2);
    }
}
