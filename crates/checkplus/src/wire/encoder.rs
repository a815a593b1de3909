//! Request-side serialization.

use std::fmt::Write;

use indexmap::IndexMap;
use serde::Serialize;

/// Ordered set of named string fields.
///
/// Insertion order is wire order. Re-inserting an existing name replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSet(IndexMap<String, String>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn encoded_len(&self) -> usize {
        self.iter()
            .map(|(k, v)| token_len(k) + token_len(v))
            .sum()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Serialize `fields` as `<N>:<name><M>:<value>` per field, in insertion order.
///
/// N and M are UTF-8 byte lengths. Nothing inside names or values is escaped;
/// the decoder relies solely on the length prefix.
pub fn encode(fields: &FieldSet) -> String {
    let mut out = String::with_capacity(fields.encoded_len());
    for (name, value) in fields.iter() {
        push_token(&mut out, name);
        push_token(&mut out, value);
    }
    tracing::trace!(fields = fields.len(), wire_len = out.len(), "Encoded field set");
    out
}

fn push_token(out: &mut String, text: &str) {
    // fmt::Write for String is infallible
    let _ = write!(out, "{}:", text.len());
    out.push_str(text);
}

fn token_len(text: &str) -> usize {
    let digits = text.len().checked_ilog10().map_or(1, |d| d as usize + 1);
    digits + 1 + text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_insertion_order() {
        let fields = FieldSet::new()
            .with("SITECODE", "AB123")
            .with("AUTH_TYPE", "M")
            .with("RTN_URL", "https://example.com/ok");

        insta::assert_snapshot!(
            encode(&fields),
            @"8:SITECODE5:AB1239:AUTH_TYPE1:M7:RTN_URL22:https://example.com/ok"
        );
    }

    #[test]
    fn empty_value_encodes_as_zero_length() {
        let fields = FieldSet::new().with("GENDER", "").with("CUSTOMIZE", "Mobile");
        assert_eq!(encode(&fields), "6:GENDER0:9:CUSTOMIZE6:Mobile");
    }

    #[test]
    fn colons_and_digits_are_not_escaped() {
        let fields = FieldSet::new().with("URL", "http://h:8080/12:3");
        assert_eq!(encode(&fields), "3:URL18:http://h:8080/12:3");
    }

    #[test]
    fn lengths_count_utf8_bytes() {
        let fields = FieldSet::new().with("UTF8_NAME", "홍길동");
        assert_eq!(encode(&fields), "9:UTF8_NAME9:홍길동");
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut fields = FieldSet::new().with("A", "1").with("B", "2");
        fields.insert("A", "3");
        assert_eq!(encode(&fields), "1:A1:31:B1:2");
    }

    #[test]
    fn empty_field_set_encodes_empty() {
        assert_eq!(encode(&FieldSet::new()), "");
    }

    #[test]
    fn capacity_hint_matches_output() {
        let fields: FieldSet = [("REQ_SEQ", "0123456789abcdef"), ("X", "")]
            .into_iter()
            .collect();
        assert_eq!(fields.encoded_len(), encode(&fields).len());
    }
}
