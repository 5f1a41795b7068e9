//! Custom validation functions shared across configuration sections.

use std::time::Duration;

use homemon_classify::RuleBook;
use regex::Regex;
use validator::ValidationError;

/// Key prefixes become part of `<prefix>:priority`; a colon would make the
/// layout ambiguous.
pub fn validate_namespace(prefix: &str) -> Result<(), ValidationError> {
    let re = Regex::new("^[A-Za-z0-9_.-]+$").map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(prefix) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_namespace")
            .with_message("must be non-empty and contain only [A-Za-z0-9_.-]".into()))
    }
}

pub fn validate_redis_url(url: &str) -> Result<(), ValidationError> {
    let scheme_ok = ["redis://", "rediss://", "redis+unix://", "unix://"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    if scheme_ok && url.len() > url.find("://").map_or(0, |i| i + 3) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_redis_url"))
    }
}

pub fn validate_nonzero_duration(value: &Duration) -> Result<(), ValidationError> {
    if value.is_zero() {
        Err(ValidationError::new("zero_duration").with_message("must be greater than zero".into()))
    } else {
        Ok(())
    }
}

pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"].contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

pub fn validate_rule_book(book: &RuleBook) -> Result<(), ValidationError> {
    book.validate().map_err(|(kind, err)| {
        let mut error = ValidationError::new("invalid_rules").with_message(format!("{kind}: {err}").into());
        error.add_param("kind".into(), &kind);
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemon_classify::ThresholdRule;

    #[test]
    fn namespaces() {
        assert!(validate_namespace("homemon").is_ok());
        assert!(validate_namespace("home-mon.v2").is_ok());
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("a:b").is_err());
    }

    #[test]
    fn redis_urls() {
        assert!(validate_redis_url("redis://localhost:6379").is_ok());
        assert!(validate_redis_url("rediss://cache.internal:6380/2").is_ok());
        assert!(validate_redis_url("redis://").is_err());
        assert!(validate_redis_url("localhost:6379").is_err());
    }

    #[test]
    fn durations_and_levels() {
        assert!(validate_nonzero_duration(&Duration::from_secs(1)).is_ok());
        assert!(validate_nonzero_duration(&Duration::ZERO).is_err());
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn rule_book_errors_name_kind() {
        let mut book = RuleBook::new();
        book.rules_insert("co2", vec![ThresholdRule::new(10.0, 1.0, 1, "red")]);
        let err = validate_rule_book(&book).unwrap_err();
        assert_eq!(err.code, "invalid_rules");
        assert!(err.message.unwrap().starts_with("co2: "));
    }
}
