use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("Required environment variable not found: {0}")]
    RequiredVarNotFound(String),

    #[error("Recursive interpolation limit exceeded")]
    RecursionLimit,
}

pub type InterpolationResult<T> = Result<T, InterpolationError>;

const MAX_RECURSION_DEPTH: usize = 10;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Replaces `${VAR}` and `${VAR:-default}` with values from the process
/// environment. A variable without default that is not set is an error.
pub fn interpolate(input: &str) -> InterpolationResult<String> {
    interpolate_with_depth(input, 0)
}

fn interpolate_with_depth(input: &str, depth: usize) -> InterpolationResult<String> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(InterpolationError::RecursionLimit);
    }

    let mut result = String::with_capacity(input.len());
    let mut last = 0;

    for cap in VAR_PATTERN.captures_iter(input) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        let replacement = match std::env::var(var_name.as_str()) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => interpolate_with_depth(default.as_str(), depth + 1)?,
                None => {
                    return Err(InterpolationError::RequiredVarNotFound(
                        var_name.as_str().to_string(),
                    ));
                }
            },
        };

        result.push_str(&input[last..full_match.start()]);
        result.push_str(&replacement);
        last = full_match.end();
    }

    result.push_str(&input[last..]);
    Ok(result)
}

pub fn interpolate_toml(value: &mut toml::Value) -> InterpolationResult<()> {
    match value {
        toml::Value::String(s) => {
            *s = interpolate(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr {
                interpolate_toml(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                interpolate_toml(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn has_variables(input: &str) -> bool {
    VAR_PATTERN.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_var() {
        std::env::set_var("TLR_TEST_VAR_SIMPLE", "hello");
        let result = interpolate("${TLR_TEST_VAR_SIMPLE}").unwrap();
        assert_eq!(result, "hello");
        std::env::remove_var("TLR_TEST_VAR_SIMPLE");
    }

    #[test]
    fn test_multiple_vars_with_text() {
        std::env::set_var("TLR_TEST_HOST", "testlink.local");
        std::env::set_var("TLR_TEST_PATH", "lib/api/xmlrpc/v1/xmlrpc.php");
        let result = interpolate("http://${TLR_TEST_HOST}/${TLR_TEST_PATH}").unwrap();
        assert_eq!(
            result,
            "http://testlink.local/lib/api/xmlrpc/v1/xmlrpc.php"
        );
        std::env::remove_var("TLR_TEST_HOST");
        std::env::remove_var("TLR_TEST_PATH");
    }

    #[test]
    fn test_missing_var_error() {
        let result = interpolate("${TLR_THIS_VAR_DOES_NOT_EXIST_12345}");
        assert!(matches!(
            result,
            Err(InterpolationError::RequiredVarNotFound(_))
        ));
    }

    #[test]
    fn test_default_value() {
        let result = interpolate("${TLR_NONEXISTENT_VAR_123:-default_value}").unwrap();
        assert_eq!(result, "default_value");

        let result = interpolate("prefix${TLR_NONEXISTENT_VAR_456:-}suffix").unwrap();
        assert_eq!(result, "prefixsuffix");
    }

    #[test]
    fn test_no_interpolation() {
        assert_eq!(interpolate("plain $TEXT").unwrap(), "plain $TEXT");
        assert!(!has_variables("$VAR"));
        assert!(has_variables("${VAR:-x}"));
    }

    #[test]
    fn test_interpolate_toml() {
        std::env::set_var("TLR_TEST_TOML_KEY", "secret");

        let mut value: toml::Value = toml::from_str(
            r#"
            dev_key = "${TLR_TEST_TOML_KEY}"
            nested = { url = "${TLR_TEST_TOML_MISSING:-http://localhost}" }
            "#,
        )
        .unwrap();
        interpolate_toml(&mut value).unwrap();

        assert_eq!(value["dev_key"].as_str().unwrap(), "secret");
        assert_eq!(value["nested"]["url"].as_str().unwrap(), "http://localhost");

        std::env::remove_var("TLR_TEST_TOML_KEY");
    }
}
