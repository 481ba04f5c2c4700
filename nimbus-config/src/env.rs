// Environment variable loading

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;

/// Environment variable loader.
///
/// Keys keep the case of the variable name. With a prefix, only variables
/// starting with `{prefix}_` are loaded and the prefix is stripped, so
/// `NIMBUS_AWS_REGION` becomes `AWS_REGION`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn load(&self) -> HashMap<String, String> {
        self.filter(utf8_vars(env::vars_os()))
    }

    fn filter(&self, vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match &self.prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str())
                        && let Some(stripped) = rest.strip_prefix('_')
                        && !stripped.is_empty()
                    {
                        config.insert(stripped.to_string(), value);
                    }
                }
                None => {
                    config.insert(key, value);
                }
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                tracing::warn!(key = %key, "Skipping environment variable with non UTF-8 value");
                None
            }
            (Err(key), _) => {
                tracing::warn!(key = ?key, "Skipping environment variable with non UTF-8 name");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_keeps_case_without_prefix() {
        let loader = EnvLoader::new(None);
        let loaded = loader.filter(vars(&[("AWS_REGION", "eu-west-1")]));

        assert_eq!(loaded.get("AWS_REGION").map(String::as_str), Some("eu-west-1"));
        assert!(!loaded.contains_key("aws_region"));
    }

    #[test]
    fn test_filter_strips_prefix() {
        let loader = EnvLoader::new(Some("NIMBUS".to_string()));
        let loaded = loader.filter(vars(&[
            ("NIMBUS_AWS_REGION", "us-east-1"),
            ("NIMBUSX_OTHER", "ignored"),
            ("AWS_REGION", "ignored"),
            ("NIMBUS_", "ignored"),
        ]));

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("AWS_REGION").map(String::as_str), Some("us-east-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let raw = vec![
            (OsString::from("AWS_REGION"), OsString::from("us-east-1")),
            (
                OsString::from("BROKEN_VALUE"),
                OsString::from_vec(vec![0xff, 0xfe]),
            ),
            (OsString::from_vec(vec![0xff]), OsString::from("x")),
        ];

        let loaded: Vec<_> = utf8_vars(raw).collect();
        assert_eq!(loaded, vec![("AWS_REGION".to_string(), "us-east-1".to_string())]);
    }
}
