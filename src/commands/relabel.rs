use std::path::PathBuf;

use argh::FromArgs;
use exitcode::ExitCode;
use labels::{LabelSet, is_valid_label_name};
use promeval::evaluate_relabel;
use promeval::printer::{Format, Printer};
use tracing::error;

use super::{handle_eval_error, load_config};

/// Parse `name=value`, the value could be empty.
fn parse_label(text: &str) -> Result<(&str, &str), String> {
    let Some((name, value)) = text.split_once('=') else {
        return Err(format!("invalid label {text:?}, name=value expected"));
    };

    if !is_valid_label_name(name) {
        return Err(format!("invalid label name {name:?}"));
    }

    Ok((name, value))
}

#[derive(FromArgs)]
#[argh(
    subcommand,
    name = "relabel",
    description = "Apply relabel rules of a job to the given labels",
    help_triggers("-h", "--help")
)]
pub struct Relabel {
    #[argh(positional, description = "the Prometheus config file to evaluate")]
    config_file: PathBuf,

    #[argh(
        option,
        description = "treat the config file as a configmap, the Prometheus config is the data item under this key"
    )]
    configmap_item: Option<String>,

    #[argh(option, short = 'j', description = "name of the job whose rules are applied")]
    job: String,

    #[argh(
        option,
        long = "label",
        description = "input label in the form of name=value, can be repeated"
    )]
    labels: Vec<String>,

    #[argh(switch, description = "apply relabel_configs")]
    target_rules: bool,

    #[argh(switch, description = "apply metric_relabel_configs")]
    metric_rules: bool,

    #[argh(
        option,
        short = 'o',
        default = "Format::Json",
        description = "output format, json or yaml"
    )]
    output: Format,
}

impl Relabel {
    #![allow(clippy::print_stderr)]
    pub fn run(&self) -> Result<(), ExitCode> {
        let pairs = self
            .labels
            .iter()
            .map(|text| parse_label(text))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                error!(message = "Invalid input labels", %err);
                exitcode::USAGE
            })?;
        let input = LabelSet::from_pairs(pairs);

        let config = load_config(&self.config_file, self.configmap_item.as_deref())?;

        // both kinds of rules are applied if none is selected
        let (target_rules, metric_rules) = if self.target_rules || self.metric_rules {
            (self.target_rules, self.metric_rules)
        } else {
            (true, true)
        };

        let result = evaluate_relabel(&config, &self.job, &input, target_rules, metric_rules)
            .map_err(handle_eval_error)?;

        Printer::new(std::io::stdout().lock(), self.output)
            .print(&result)
            .map_err(|err| {
                error!(message = "Print result failed", %err);
                exitcode::IOERR
            })?;

        if result.after.is_none() {
            eprintln!("Labels dropped by relabeling");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(parse_label("job=node"), Ok(("job", "node")));
        assert_eq!(parse_label("a=b=c"), Ok(("a", "b=c")));
        assert_eq!(parse_label("empty="), Ok(("empty", "")));
        assert!(parse_label("novalue").is_err());
        assert!(parse_label("foo-bar=1").is_err());
    }
}
