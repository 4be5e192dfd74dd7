/// Errors that can occur when creating validated placeholder and tag types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlaceholderError {
    /// The placeholder name was empty or contained only whitespace
    #[error("placeholder name cannot be empty")]
    Empty,
    /// The placeholder name contained braces, whitespace or a field separator
    #[error("placeholder name contains invalid characters: {0}")]
    InvalidCharacters(String),
    /// A sequence tag was empty or contained characters unsafe for file names
    #[error("invalid sequence tag: {0}")]
    InvalidTag(String),
}

/// A template placeholder token such as `{patientLastName}`.
///
/// The key is always stored in braced form. Construction accepts either the bare name
/// (`patientLastName`) or the braced token (`{patientLastName}`), so callers can build
/// field maps from prompts, YAML files or previously rendered templates interchangeably.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceholderKey(String);

impl PlaceholderKey {
    /// Creates a new `PlaceholderKey` from a bare name or braced token.
    ///
    /// Surrounding whitespace is trimmed. The name itself must be non-empty and must not
    /// contain braces, whitespace or the HL7 field separator `|`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, PlaceholderError> {
        let trimmed = input.as_ref().trim();
        let name = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(trimmed);

        if name.is_empty() {
            return Err(PlaceholderError::Empty);
        }

        if name
            .chars()
            .any(|c| c == '{' || c == '}' || c == '|' || c.is_whitespace())
        {
            return Err(PlaceholderError::InvalidCharacters(name.to_owned()));
        }

        Ok(Self(format!("{{{name}}}")))
    }

    /// Returns the braced token, e.g. `{patientLastName}`.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Returns the bare name without braces, e.g. `patientLastName`.
    pub fn name(&self) -> &str {
        &self.0[1..self.0.len() - 1]
    }
}

impl std::fmt::Display for PlaceholderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PlaceholderKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for PlaceholderKey {
    type Err = PlaceholderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for PlaceholderKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for PlaceholderKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PlaceholderKey::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Output naming tag attached to a rendered message.
///
/// Scheduling variants use `00`, event variants use a two-digit 1-based index and a few
/// auxiliary messages use fixed tags such as `15` or `ADT`. The tag only ever appears in
/// file names, so it is restricted to ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceTag(String);

impl SequenceTag {
    /// Creates a tag from arbitrary text.
    pub fn new(input: impl AsRef<str>) -> Result<Self, PlaceholderError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(PlaceholderError::InvalidTag(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Tag of the scheduling variant.
    pub fn scheduling() -> Self {
        Self("00".to_owned())
    }

    /// Tag of the `position`-th event variant (1-based), zero padded to two digits.
    pub fn event(position: usize) -> Self {
        Self(format!("{position:02}"))
    }

    /// Tag of the S15 cancellation message, numbered after its trigger event.
    pub fn canceled() -> Self {
        Self("15".to_owned())
    }

    /// Tag of the ADT admission message.
    pub fn admission() -> Self {
        Self("ADT".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SequenceTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_key_accepts_bare_and_braced_forms() {
        let bare = PlaceholderKey::new("patientLastName").unwrap();
        let braced = PlaceholderKey::new("{patientLastName}").unwrap();
        assert_eq!(bare, braced);
        assert_eq!(bare.token(), "{patientLastName}");
        assert_eq!(bare.name(), "patientLastName");
    }

    #[test]
    fn placeholder_key_rejects_empty_and_invalid_names() {
        assert_eq!(PlaceholderKey::new("  "), Err(PlaceholderError::Empty));
        assert_eq!(PlaceholderKey::new("{}"), Err(PlaceholderError::Empty));
        assert!(matches!(
            PlaceholderKey::new("patient name"),
            Err(PlaceholderError::InvalidCharacters(_))
        ));
        assert!(matches!(
            PlaceholderKey::new("{{nested}}"),
            Err(PlaceholderError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn placeholder_key_round_trips_through_yaml_as_bare_name() {
        let key = PlaceholderKey::new("{YYYYMMDD}").unwrap();
        let yaml = serde_yaml::to_string(&key).unwrap();
        assert_eq!(yaml.trim(), "YYYYMMDD");
        let parsed: PlaceholderKey = serde_yaml::from_str("\"{YYYYMMDD}\"").unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn sequence_tag_formats_event_positions() {
        assert_eq!(SequenceTag::scheduling().as_str(), "00");
        assert_eq!(SequenceTag::event(1).as_str(), "01");
        assert_eq!(SequenceTag::event(14).as_str(), "14");
        assert_eq!(SequenceTag::new("ADT").unwrap().as_str(), "ADT");
        assert!(SequenceTag::new("../x").is_err());
    }
}
