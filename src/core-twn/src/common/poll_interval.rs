use std::{str::FromStr, time::Duration};

use crate::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

/// Retrieves the value of the environment variable as a duration, or `default` if unset.
pub fn duration_from_env(units: TimeUnit, env_var_name: &str, default: u64) -> Result<Duration, Error> {
    let amount = number_from_env(env_var_name, default)?;
    Ok(match units {
        TimeUnit::Seconds => Duration::from_secs(amount),
        TimeUnit::Milliseconds => Duration::from_millis(amount),
    })
}

/// Retrieves the value of the environment variable as a number, or `default` if unset or empty.
pub fn number_from_env<T>(env_var_name: &str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_or_default(env_var_name, std::env::var(env_var_name).ok(), default)
}

/// Parses `raw` when present and non-empty; `env_var_name` is only used in the error.
pub fn parse_or_default<T>(env_var_name: &str, raw: Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) if !v.trim().is_empty() => v.trim().parse::<T>().map_err(|e| Error::InvalidConfig {
            var: env_var_name.to_string(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default("X", None, 10u64).unwrap(), 10);
        assert_eq!(parse_or_default("X", Some("  ".to_string()), 10u64).unwrap(), 10);
        assert_eq!(parse_or_default("X", Some(" 25 ".to_string()), 10u64).unwrap(), 25);
    }

    #[test]
    fn test_parse_or_default_names_the_variable() {
        let err = parse_or_default("AI_BATCH_SIZE", Some("ten".to_string()), 10i64).unwrap_err();
        assert!(err.to_string().contains("AI_BATCH_SIZE"));
    }

    #[test]
    fn test_duration_from_unset_env_uses_default() {
        let d = duration_from_env(TimeUnit::Milliseconds, "TWN_TEST_SURELY_UNSET_VAR", 1500).unwrap();
        assert_eq!(d, Duration::from_millis(1500));
        let d = duration_from_env(TimeUnit::Seconds, "TWN_TEST_SURELY_UNSET_VAR", 2).unwrap();
        assert_eq!(d, Duration::from_secs(2));
    }
}
