//! Query-string access with repeated keys.

/// Ordered `key=value` pairs from a query string.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First non-empty value for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_repeated_keys_keep_order() {
        let p = params(&[("table", "t"), ("val", "b"), ("val", "a"), ("val", "")]);
        assert_eq!(p.first("table"), Some("t"));
        assert_eq!(p.all("val"), vec!["b", "a", ""]);
        assert!(p.all("col").is_empty());
    }

    #[test]
    fn test_first_skips_empty() {
        let p = params(&[("table", ""), ("table", "events")]);
        assert_eq!(p.first("table"), Some("events"));
        assert_eq!(p.first("missing"), None);
    }
}
