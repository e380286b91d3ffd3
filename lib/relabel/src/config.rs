use labels::is_valid_label_name;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::regexp::Regexp;

pub const DEFAULT_SEPARATOR: &str = ";";
pub const DEFAULT_REPLACEMENT: &str = "$1";

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_replacement() -> String {
    DEFAULT_REPLACEMENT.to_string()
}

/// Action to perform on a matched label set
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Performs a regex replacement on the concatenated source labels
    #[default]
    Replace,
    /// Drops targets for which the concatenated source labels do not match the regex
    Keep,
    /// Drops targets for which the concatenated source labels match the regex
    Drop,
    /// Sets the target label to the modulus of a hash of the concatenated source labels
    HashMod,
    /// Copies labels to other label names, names are matched against the regex
    LabelMap,
    /// Drops any label whose name matches the regex
    LabelDrop,
    /// Drops any label whose name does not match the regex
    LabelKeep,
    /// Maps the concatenated source labels to their lower case
    Lowercase,
    /// Maps the concatenated source labels to their upper case
    Uppercase,
    /// Drops targets for which the concatenated source labels do not equal the target label
    KeepEqual,
    /// Drops targets for which the concatenated source labels equal the target label
    DropEqual,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Replace => "replace",
            Action::Keep => "keep",
            Action::Drop => "drop",
            Action::HashMod => "hashmod",
            Action::LabelMap => "labelmap",
            Action::LabelDrop => "labeldrop",
            Action::LabelKeep => "labelkeep",
            Action::Lowercase => "lowercase",
            Action::Uppercase => "uppercase",
            Action::KeepEqual => "keepequal",
            Action::DropEqual => "dropequal",
        }
    }
}

/// A single relabeling rule.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelabelConfig {
    /// The source labels select values from existing labels. Their content is
    /// concatenated using the configured separator and matched against the
    /// configured regular expression.
    #[serde(default)]
    pub source_labels: Vec<String>,

    /// Separator placed between concatenated source label values.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Regular expression against which the extracted value is matched.
    #[serde(default)]
    pub regex: Regexp,

    /// Modulus to take of the hash of the source label values.
    #[serde(default)]
    pub modulus: u64,

    /// Label to which the resulting value is written in a replace action.
    #[serde(default)]
    pub target_label: String,

    /// Replacement value against which a regex replace is performed if the
    /// regular expression matches.
    #[serde(default = "default_replacement")]
    pub replacement: String,

    #[serde(default)]
    pub action: Action,
}

impl Default for RelabelConfig {
    fn default() -> Self {
        Self {
            source_labels: vec![],
            separator: default_separator(),
            regex: Regexp::default(),
            modulus: 0,
            target_label: String::new(),
            replacement: default_replacement(),
            action: Action::Replace,
        }
    }
}

impl RelabelConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let action = self.action;

        match action {
            Action::Replace
            | Action::HashMod
            | Action::Lowercase
            | Action::Uppercase
            | Action::KeepEqual
            | Action::DropEqual => {
                if self.target_label.is_empty() {
                    return Err(Error::MissingTargetLabel(action.as_str()));
                }
            }
            _ => {}
        }

        match action {
            // the target label of replace could be a template, like `${1}`
            Action::Replace => {
                if !self.target_label.contains('$') && !is_valid_label_name(&self.target_label) {
                    return Err(Error::InvalidTargetLabel {
                        action: action.as_str(),
                        target: self.target_label.clone(),
                    });
                }
            }
            Action::Lowercase | Action::Uppercase | Action::KeepEqual | Action::DropEqual => {
                if !is_valid_label_name(&self.target_label) {
                    return Err(Error::InvalidTargetLabel {
                        action: action.as_str(),
                        target: self.target_label.clone(),
                    });
                }
            }
            Action::HashMod => {
                if self.modulus == 0 {
                    return Err(Error::ZeroModulus);
                }
            }
            Action::LabelDrop | Action::LabelKeep => {
                if !self.source_labels.is_empty()
                    || !self.target_label.is_empty()
                    || self.modulus != 0
                    || self.separator != DEFAULT_SEPARATOR
                    || self.replacement != DEFAULT_REPLACEMENT
                {
                    return Err(Error::OnlyRegex(action.as_str()));
                }
            }
            _ => {}
        }

        if matches!(action, Action::KeepEqual | Action::DropEqual)
            && (self.regex != Regexp::default() || self.replacement != DEFAULT_REPLACEMENT)
        {
            return Err(Error::EqualWithRegex(action.as_str()));
        }

        Ok(())
    }
}
