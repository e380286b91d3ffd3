use std::fmt;
use std::ops::Deref;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_REGEX: &str = "(.*)";

/// A regular expression which is always fully anchored, the original
/// expression is kept so it can be serialized back as it was written.
#[derive(Clone)]
pub struct Regexp {
    original: String,
    regex: Regex,
}

impl Regexp {
    pub fn new(expr: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{expr})$"))?;

        Ok(Self {
            original: expr.to_string(),
            regex,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl Default for Regexp {
    fn default() -> Self {
        Self::new(DEFAULT_REGEX).expect("default regex is valid")
    }
}

impl Deref for Regexp {
    type Target = Regex;

    fn deref(&self) -> &Self::Target {
        &self.regex
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original
    }
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regexp").field(&self.original).finish()
    }
}

impl Serialize for Regexp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Regexp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        Regexp::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored() {
        let re = Regexp::new("foo|bar").unwrap();

        assert!(re.is_match("foo"));
        assert!(re.is_match("bar"));
        assert!(!re.is_match("foobar"));
        assert!(!re.is_match("xfoo"));
        assert_eq!(re.as_str(), "foo|bar");
    }

    #[test]
    fn default_matches_anything() {
        let re = Regexp::default();

        assert!(re.is_match(""));
        assert!(re.is_match("any;thing"));
    }

    #[test]
    fn deserialize_invalid() {
        let result = serde_yaml::from_str::<Regexp>("'(unclosed'");
        assert!(result.is_err());
    }
}
