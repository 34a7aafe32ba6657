//! Form bodies sent to the auth endpoint and the `key=value` text it answers with

use std::collections::HashMap;

/// Ordered form fields for an auth endpoint call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    fields: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value with the same name
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key.to_string(), value)),
        }
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Parse an auth endpoint response body
///
/// Tokens are split on any whitespace. Tokens without `=` are skipped, keys
/// are lowercased and both sides are trimmed; the first `=` separates key and
/// value, so values may themselves contain `=`.
pub fn parse_key_values(body: &str) -> HashMap<String, String> {
    body.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_newline_separated() {
        let parsed = parse_key_values("auth=XYZ123\nexpiry=3600");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["auth"], "XYZ123");
        assert_eq!(parsed["expiry"], "3600");
    }

    #[test]
    fn test_parse_ignores_tokens_without_equals() {
        assert!(parse_key_values("garbage noequals here").is_empty());
        assert!(parse_key_values("").is_empty());
    }

    #[test]
    fn test_parse_lowercases_keys() {
        let parsed = parse_key_values("Error=BadAuthentication");
        assert_eq!(parsed["error"], "BadAuthentication");
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let parsed = parse_key_values("Token=aas_et/AKppINa==  \r\n services=hist,mail ");
        assert_eq!(parsed["token"], "aas_et/AKppINa==");
        assert_eq!(parsed["services"], "hist,mail");
    }

    #[test]
    fn test_form_params_set_and_remove() {
        let mut params = FormParams::new();
        params.set("Email", "user@example.com").set("service", "ac2dm");
        params.set("service", "androidmarket");

        assert_eq!(params.get("service"), Some("androidmarket"));
        assert_eq!(params.fields().len(), 2);
        assert_eq!(params.remove("Email").as_deref(), Some("user@example.com"));
        assert_eq!(params.remove("Email"), None);
        assert_eq!(params.fields()[0].0, "service");
    }
}
