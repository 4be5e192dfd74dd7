//! Placeholder → value mappings.
//!
//! A [`FieldValues`] is what the UI or command line hands to the renderer. Keys are kept in
//! braced token form so they can be matched against template text directly.

use crate::error::{CaseGenError, CaseGenResult};
use casegen_types::PlaceholderKey;
use std::collections::BTreeMap;

/// Mapping of placeholder token (e.g. `{patientLastName}`) to its value.
///
/// Absent keys are significant: the renderer leaves their tokens in the output so a user can
/// see which fields were never filled in. A key bound to an empty string substitutes the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "BTreeMap<String, Option<ScalarValue>>")]
pub struct FieldValues(BTreeMap<String, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(key, value)` pairs; keys may be bare names or braced tokens.
    pub fn from_pairs<K, V, I>(pairs: I) -> CaseGenResult<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut values = Self::new();
        for (key, value) in pairs {
            values.set(key, value)?;
        }
        Ok(values)
    }

    /// Bind `key` to `value`, returning the previous value if any.
    pub fn set(
        &mut self,
        key: impl AsRef<str>,
        value: impl Into<String>,
    ) -> CaseGenResult<Option<String>> {
        let key = PlaceholderKey::new(key)?;
        Ok(self.0.insert(key.token().to_owned(), value.into()))
    }

    /// Bind `key` only when `value` has visible content.
    ///
    /// This mirrors the prompt flows, where leaving an answer blank means "keep the
    /// placeholder".
    pub fn set_if_present(
        &mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> CaseGenResult<()> {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Bind one of the crate's own token constants.
    pub(crate) fn bind(&mut self, token: &'static str, value: impl Into<String>) {
        self.0.insert(token.to_owned(), value.into());
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = PlaceholderKey::new(key).ok()?;
        self.0.get(key.token()).map(String::as_str)
    }

    /// Value of `key` if it is bound to something other than whitespace.
    pub fn get_present(&self, key: impl AsRef<str>) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<String> {
        let key = PlaceholderKey::new(key).ok()?;
        self.0.remove(key.token())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(token, value)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn lookup_token(&self, token: &str) -> Option<&str> {
        self.0.get(token).map(String::as_str)
    }

    /// Fill keys missing from `self` with the values in `defaults`.
    ///
    /// Blank values count as missing, so a default replaces an explicitly empty answer.
    pub fn apply_defaults(&mut self, defaults: &FieldValues) {
        for (key, value) in &defaults.0 {
            let missing = self.0.get(key).map_or(true, |v| v.trim().is_empty());
            if missing {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Scalar accepted as a field value in YAML input.
///
/// Integers are accepted so `duration: 90` works unquoted. Digit strings with a leading zero
/// such as `0730` are not integers to the YAML parser and arrive as text unchanged.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Integer(i64),
    Text(String),
}

impl TryFrom<BTreeMap<String, Option<ScalarValue>>> for FieldValues {
    type Error = CaseGenError;

    fn try_from(map: BTreeMap<String, Option<ScalarValue>>) -> Result<Self, Self::Error> {
        let mut values = FieldValues::new();
        for (key, value) in map {
            match value {
                Some(ScalarValue::Text(text)) => values.set_if_present(&key, text)?,
                Some(ScalarValue::Integer(number)) => {
                    values.set(&key, number.to_string())?;
                }
                None => {
                    PlaceholderKey::new(&key)?;
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_normalises_bare_names_to_tokens() {
        let mut values = FieldValues::new();
        values.set("patientLastName", "SMITH").unwrap();
        assert_eq!(values.get("{patientLastName}"), Some("SMITH"));
        assert_eq!(values.iter().next(), Some(("{patientLastName}", "SMITH")));
    }

    #[test]
    fn set_rejects_invalid_keys() {
        let mut values = FieldValues::new();
        let err = values.set("patient name", "x").expect_err("expected invalid key");
        assert!(matches!(err, CaseGenError::Placeholder(_)));
    }

    #[test]
    fn set_if_present_skips_blank_answers() {
        let mut values = FieldValues::new();
        values.set_if_present("{procedure}", "   ").unwrap();
        values.set_if_present("{locationOR}", " OR 5 ").unwrap();
        assert!(!values.contains("{procedure}"));
        assert_eq!(values.get("{locationOR}"), Some("OR 5"));
    }

    #[test]
    fn apply_defaults_only_fills_missing_or_blank() {
        let mut values = FieldValues::from_pairs([("cptCode", "12345"), ("procedureId", "")]).unwrap();
        let defaults =
            FieldValues::from_pairs([("cptCode", "49000"), ("procedureId", "2753"), ("addOn", "N")])
                .unwrap();
        values.apply_defaults(&defaults);
        assert_eq!(values.get("cptCode"), Some("12345"));
        assert_eq!(values.get("procedureId"), Some("2753"));
        assert_eq!(values.get("addOn"), Some("N"));
    }

    #[test]
    fn deserializes_unquoted_integers_as_text() {
        let values: FieldValues = serde_yaml::from_str("duration: 90\nYYYYMMDD: '20240601'\n").unwrap();
        assert_eq!(values.get("duration"), Some("90"));
        assert_eq!(values.get("YYYYMMDD"), Some("20240601"));
    }

    #[test]
    fn unquoted_leading_zero_digits_keep_their_zeros() {
        let values: FieldValues =
            serde_yaml::from_str("scheduledTime: 0730\npatientMRN: 00123\n").unwrap();
        assert_eq!(values.get("scheduledTime"), Some("0730"));
        assert_eq!(values.get("patientMRN"), Some("00123"));
    }

    #[test]
    fn deserializes_from_yaml_and_drops_blank_or_null_values() {
        let values: FieldValues =
            serde_yaml::from_str("patientLastName: SMITH\n\"{specialNeeds}\": ''\nlocationOR: ~\n")
                .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("patientLastName"), Some("SMITH"));
    }
}
