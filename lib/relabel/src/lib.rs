mod config;
mod regexp;

pub use config::{Action, DEFAULT_REPLACEMENT, DEFAULT_SEPARATOR, RelabelConfig};
pub use regexp::{DEFAULT_REGEX, Regexp};

use labels::{Builder, LabelSet, is_valid_label_name};
use md5::{Digest, Md5};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("relabel configuration for {0} action requires 'target_label' value")]
    MissingTargetLabel(&'static str),
    #[error("{target:?} is invalid 'target_label' for {action} action")]
    InvalidTargetLabel { action: &'static str, target: String },
    #[error("relabel configuration for hashmod requires non-zero modulus")]
    ZeroModulus,
    #[error("{0} action requires only 'regex', and no other fields")]
    OnlyRegex(&'static str),
    #[error("{0} action requires only 'source_labels' and 'target_label', and no other fields")]
    EqualWithRegex(&'static str),
}

/// Apply the rules to the label set in order. `None` is returned if the
/// label set was dropped by one of the rules.
pub fn process(labels: &LabelSet, rules: &[RelabelConfig]) -> Option<LabelSet> {
    let mut builder = Builder::new(labels);

    for rule in rules {
        if !relabel(&mut builder, rule) {
            return None;
        }
    }

    Some(builder.labels())
}

/// Returns false if the label set should be dropped.
fn relabel(builder: &mut Builder, rule: &RelabelConfig) -> bool {
    let value = rule
        .source_labels
        .iter()
        .map(|name| builder.get(name).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(&rule.separator);

    match rule.action {
        Action::Drop => {
            if rule.regex.is_match(&value) {
                return false;
            }
        }
        Action::Keep => {
            if !rule.regex.is_match(&value) {
                return false;
            }
        }
        Action::DropEqual => {
            if builder.get(&rule.target_label).unwrap_or_default() == value {
                return false;
            }
        }
        Action::KeepEqual => {
            if builder.get(&rule.target_label).unwrap_or_default() != value {
                return false;
            }
        }
        Action::Replace => {
            // no match, no replacement
            let Some(captures) = rule.regex.captures(&value) else {
                return true;
            };

            let mut target = String::new();
            captures.expand(&rule.target_label, &mut target);
            if !is_valid_label_name(&target) {
                builder.del(&rule.target_label);
                return true;
            }

            let mut result = String::new();
            captures.expand(&rule.replacement, &mut result);
            if result.is_empty() {
                builder.del(&rule.target_label);
                return true;
            }

            builder.set(target, result);
        }
        Action::Lowercase => {
            builder.set(rule.target_label.as_str(), value.to_lowercase());
        }
        Action::Uppercase => {
            builder.set(rule.target_label.as_str(), value.to_uppercase());
        }
        Action::HashMod => {
            let hash = Md5::digest(value.as_bytes());
            let mut tail = [0u8; 8];
            tail.copy_from_slice(&hash[8..]);
            let m = u64::from_be_bytes(tail) % rule.modulus;

            builder.set(rule.target_label.as_str(), m.to_string());
        }
        Action::LabelMap => {
            let current = builder.labels();
            for label in &current {
                if let Some(captures) = rule.regex.captures(&label.name) {
                    let mut name = String::new();
                    captures.expand(&rule.replacement, &mut name);
                    builder.set(name, label.value.as_str());
                }
            }
        }
        Action::LabelDrop => {
            builder.retain(|name, _value| !rule.regex.is_match(name));
        }
        Action::LabelKeep => {
            builder.retain(|name, _value| rule.regex.is_match(name));
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use labels::labels;
    use pretty_assertions::assert_eq;

    use super::*;

    fn rule(text: &str) -> RelabelConfig {
        let rule: RelabelConfig = serde_yaml::from_str(text).expect("valid rule yaml");
        rule.validate().expect("valid rule");
        rule
    }

    fn assert_relabel(input: LabelSet, rules: &[&str], want: Option<LabelSet>) {
        let rules = rules.iter().map(|text| rule(text)).collect::<Vec<_>>();

        assert_eq!(process(&input, &rules), want);
    }

    #[test]
    fn no_rules() {
        let input = labels!("a" => "foo");
        assert_relabel(input.clone(), &[], Some(input));
    }

    #[test]
    fn replace() {
        assert_relabel(
            labels!(
                "a" => "foo",
                "b" => "bar",
                "c" => "baz",
            ),
            &["
source_labels: [a]
regex: f(.*)
target_label: d
separator: ';'
replacement: ch${1}-ch${1}
"],
            Some(labels!(
                "a" => "foo",
                "b" => "bar",
                "c" => "baz",
                "d" => "choo-choo",
            )),
        );
    }

    #[test]
    fn replace_multiple_sources() {
        assert_relabel(
            labels!(
                "a" => "foo",
                "b" => "bar",
            ),
            &["
source_labels: [a, b]
regex: (.*);(.*)
target_label: c
replacement: $2-$1
"],
            Some(labels!(
                "a" => "foo",
                "b" => "bar",
                "c" => "bar-foo",
            )),
        );
    }

    #[test]
    fn replace_no_match() {
        let input = labels!("a" => "foo");

        assert_relabel(
            input.clone(),
            &["
source_labels: [a]
regex: nomatch
target_label: b
"],
            Some(input),
        );
    }

    #[test]
    fn replace_empty_result_deletes() {
        assert_relabel(
            labels!(
                "a" => "foo",
                "b" => "bar",
            ),
            &["
source_labels: [a]
regex: foo
target_label: b
replacement: ''
"],
            Some(labels!("a" => "foo")),
        );
    }

    #[test]
    fn replace_templated_target() {
        assert_relabel(
            labels!("a" => "some-name-value"),
            &["
source_labels: [a]
regex: some-([^-]+)-([^,]+)
target_label: ${1}
replacement: ${2}
"],
            Some(labels!(
                "a" => "some-name-value",
                "name" => "value",
            )),
        );
    }

    #[test]
    fn drop_and_keep() {
        let input = labels!(
            "a" => "foo",
            "b" => "bar",
        );

        assert_relabel(
            input.clone(),
            &["
source_labels: [a]
regex: f.*
action: drop
"],
            None,
        );
        assert_relabel(
            input.clone(),
            &["
source_labels: [a]
regex: f.*
action: keep
"],
            Some(input.clone()),
        );
        assert_relabel(
            input,
            &["
source_labels: [b]
regex: f.*
action: keep
"],
            None,
        );
    }

    #[test]
    fn keep_missing_source_matches_empty() {
        let input = labels!("a" => "foo");

        assert_relabel(
            input.clone(),
            &["
source_labels: [missing]
regex: ''
action: keep
"],
            Some(input),
        );
    }

    #[test]
    fn equal() {
        let input = labels!(
            "a" => "foo",
            "b" => "foo",
            "c" => "bar",
        );

        assert_relabel(
            input.clone(),
            &["
source_labels: [a]
target_label: b
action: keepequal
"],
            Some(input.clone()),
        );
        assert_relabel(
            input.clone(),
            &["
source_labels: [a]
target_label: c
action: keepequal
"],
            None,
        );
        assert_relabel(
            input,
            &["
source_labels: [a]
target_label: b
action: dropequal
"],
            None,
        );
    }

    #[test]
    fn hashmod() {
        let rules = [rule(
            "
source_labels: [c]
target_label: d
action: hashmod
modulus: 1000
",
        )];
        let input = labels!(
            "a" => "foo",
            "b" => "bar",
            "c" => "baz",
        );

        let output = process(&input, &rules).unwrap();
        let value = output.get("d").unwrap().parse::<u64>().unwrap();
        assert!(value < 1000);

        // deterministic
        assert_eq!(process(&input, &rules), Some(output));
    }

    #[test]
    fn labelmap() {
        assert_relabel(
            labels!(
                "__meta_kubernetes_pod_label_app" => "web",
                "__meta_kubernetes_pod_label_tier" => "frontend",
                "job" => "pods",
            ),
            &["
regex: __meta_kubernetes_pod_label_(.+)
action: labelmap
"],
            Some(labels!(
                "__meta_kubernetes_pod_label_app" => "web",
                "__meta_kubernetes_pod_label_tier" => "frontend",
                "app" => "web",
                "job" => "pods",
                "tier" => "frontend",
            )),
        );
    }

    #[test]
    fn labeldrop_and_labelkeep() {
        let input = labels!(
            "a" => "foo",
            "b1" => "bar",
            "b2" => "baz",
        );

        assert_relabel(
            input.clone(),
            &["
regex: b.*
action: labeldrop
"],
            Some(labels!("a" => "foo")),
        );
        assert_relabel(
            input,
            &["
regex: b.*
action: labelkeep
"],
            Some(labels!(
                "b1" => "bar",
                "b2" => "baz",
            )),
        );
    }

    #[test]
    fn case() {
        assert_relabel(
            labels!("a" => "FoO"),
            &[
                "
source_labels: [a]
target_label: lower
action: lowercase
",
                "
source_labels: [a]
target_label: upper
action: uppercase
",
            ],
            Some(labels!(
                "a" => "FoO",
                "lower" => "foo",
                "upper" => "FOO",
            )),
        );
    }

    #[test]
    fn everything_removed_is_not_dropped() {
        assert_relabel(
            labels!("a" => "foo"),
            &["
regex: .*
action: labeldrop
"],
            Some(LabelSet::new()),
        );
    }
}
