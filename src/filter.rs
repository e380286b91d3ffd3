use regex::Regex;

use crate::target::Target;

/// Selects jobs by name, an empty filter selects every job.
#[derive(Clone, Debug, Default)]
pub struct JobFilter {
    names: Vec<String>,
}

impl JobFilter {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn matches(&self, job_name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|name| name == job_name)
    }
}

/// Selects target groups by their source, the pattern must match the whole
/// source.
#[derive(Clone, Debug, Default)]
pub struct SourceFilter {
    pattern: Option<Regex>,
}

impl SourceFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;

        Ok(Self {
            pattern: Some(regex),
        })
    }

    pub fn matches(&self, source: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(source),
            None => true,
        }
    }
}

/// Order targets by job name and source, targets with the same job name and
/// source keep their relative order.
pub fn sort_targets(targets: &mut [Target]) {
    targets.sort_by(|a, b| {
        a.job_name
            .cmp(&b.job_name)
            .then_with(|| a.source.cmp(&b.source))
    });
}
