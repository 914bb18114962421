//! Query parameters.

use std::collections::BTreeMap;

use url::Url;

/// Ordered multi-map of query parameters.
///
/// Keys are kept sorted so the encoded query string is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap(BTreeMap<String, Vec<String>>);

impl QueryMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Replace every value of a key with a single one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Replace the values of each key present in `other`.
    pub fn replace_keys(&mut self, other: &Self) {
        for (key, values) in &other.0 {
            self.0.insert(key.clone(), values.clone());
        }
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }

    /// First value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.first().map(String::as_str)
    }

    /// Every value of a key.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if there is no parameter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(key, value)` pairs, repeated keys included.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
    }

    /// Encode as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    /// Merge into the query of `url`.
    ///
    /// Parameters already in the URL are kept unless this map sets the same
    /// key, in which case this map's values win. The result is re-encoded
    /// with sorted keys.
    pub fn merge_into(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut merged = Self::from_url(url);
        merged.replace_keys(self);
        let encoded = merged.encode();
        url.set_query(Some(&encoded));
    }

    fn from_url(url: &Url) -> Self {
        let mut map = Self::new();
        for (key, value) in url.query_pairs() {
            map.add(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.add(key, value);
        }
        map
    }
}
