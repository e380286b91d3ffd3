mod builder;
mod set;

pub use builder::Builder;
pub use set::{Label, LabelSet};

/// The name of the label that holds the `host:port` of the target
pub const ADDRESS_LABEL: &str = "__address__";
/// The name of the label that holds the scheme on which to scrape a target
pub const SCHEME_LABEL: &str = "__scheme__";
/// The name of the label that holds the path on which to scrape a target
pub const METRICS_PATH_LABEL: &str = "__metrics_path__";
pub const JOB_LABEL: &str = "job";
pub const INSTANCE_LABEL: &str = "instance";

/// Meta labels are attached by service discovery, they are available
/// to relabeling rules only and removed before the target is finalized.
pub const META_LABEL_PREFIX: &str = "__meta_";
/// Prefix for labels that are encoded as URL parameters of the scrape request.
pub const PARAM_LABEL_PREFIX: &str = "__param_";

/// Label names must match `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Label values could be any UTF-8 text, but a value which carries control
/// characters (other than whitespace) or replacement characters left by lossy
/// decoding is considered broken.
pub fn is_valid_label_value(value: &str) -> bool {
    !value.chars().any(|c| {
        c == char::REPLACEMENT_CHARACTER || (c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    })
}

#[macro_export]
macro_rules! labels {
    // Done without trailing comma
    ( $($x:expr => $y:expr),* ) => ({
        let mut _pairs: Vec<(String, String)> = Vec::new();
        $(
            _pairs.push(($x.into(), $y.into()));
        )*
        $crate::LabelSet::from_pairs(_pairs)
    });
    // Done with trailing comma
    ( $($x:expr => $y:expr,)* ) => (
        $crate::labels!{$($x => $y),*}
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names() {
        for (name, want) in [
            ("job", true),
            ("__address__", true),
            ("_", true),
            ("a1_b2", true),
            ("", false),
            ("1abc", false),
            ("foo-bar", false),
            ("foo.bar", false),
            ("ünicode", false),
        ] {
            assert_eq!(is_valid_label_name(name), want, "name: {name:?}");
        }
    }

    #[test]
    fn label_values() {
        for (value, want) in [
            ("", true),
            ("10.0.0.1:80", true),
            ("multi\nline\ttext", true),
            ("ünicode ✓", true),
            ("nul\0byte", false),
            ("bell\u{7}", false),
            ("lossy \u{FFFD}", false),
        ] {
            assert_eq!(is_valid_label_value(value), want, "value: {value:?}");
        }
    }

    #[test]
    fn macro_builds_sorted_set() {
        let set = labels!(
            "b" => "2",
            "a" => "1",
        );

        let names = set.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }
}
