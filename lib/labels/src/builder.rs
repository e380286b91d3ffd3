use std::collections::BTreeMap;

use crate::LabelSet;

/// `Builder` allows modifying a `LabelSet` by name before it is finalized.
///
/// Setting a label to an empty value is the same as deleting it.
#[derive(Clone, Debug)]
pub struct Builder {
    labels: BTreeMap<String, String>,
}

impl Builder {
    pub fn new(base: &LabelSet) -> Self {
        let labels = base
            .iter()
            .map(|l| (l.name.clone(), l.value.clone()))
            .collect();

        Self { labels }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();

        if value.is_empty() {
            self.labels.remove(&name);
        } else {
            self.labels.insert(name, value);
        }

        self
    }

    pub fn del(&mut self, name: &str) -> &mut Self {
        self.labels.remove(name);
        self
    }

    /// Keep only the labels for which the predicate returns true.
    pub fn retain<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&str, &str) -> bool,
    {
        self.labels.retain(|name, value| f(name, value));
        self
    }

    pub fn labels(&self) -> LabelSet {
        LabelSet::from(self.labels.clone())
    }
}

impl From<LabelSet> for Builder {
    fn from(set: LabelSet) -> Self {
        Self {
            labels: set.into_map(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::labels;

    #[test]
    fn set_get_del() {
        let base = labels!(
            "a" => "1",
            "b" => "2",
        );

        let mut builder = Builder::new(&base);
        builder.set("c", "3").del("a").set("b", "22");

        assert_eq!(builder.get("a"), None);
        assert_eq!(builder.get("b"), Some("22"));
        assert_eq!(
            builder.labels(),
            labels!(
                "b" => "22",
                "c" => "3",
            )
        );

        // base is untouched
        assert_eq!(base.get("a"), Some("1"));
    }

    #[test]
    fn empty_value_deletes() {
        let mut builder = Builder::from(labels!("a" => "1"));
        builder.set("a", "");

        assert!(builder.labels().is_empty());
    }

    #[test]
    fn retain() {
        let mut builder = Builder::from(labels!(
            "__meta_foo" => "x",
            "job" => "node",
        ));
        builder.retain(|name, _| !name.starts_with("__meta_"));

        assert_eq!(builder.labels(), labels!("job" => "node"));
    }
}
