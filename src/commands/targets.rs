use std::path::PathBuf;
use std::time::Duration;

use argh::FromArgs;
use exitcode::ExitCode;
use promeval::discovery::{DEFAULT_TIMEOUT, DiscoveryLog, DiscoveryOptions};
use promeval::duration::{format_duration, parse_duration};
use promeval::evaluate_targets;
use promeval::filter::{JobFilter, SourceFilter};
use promeval::printer::{Format, Printer};
use tracing::{error, info, warn};

use super::{handle_eval_error, load_config, shutdown_on_signal};

fn default_discovery_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|err| format!("invalid duration {value:?}, {err}"))
}

#[derive(FromArgs)]
#[argh(
    subcommand,
    name = "targets",
    description = "Evaluate and print scrape targets of the configuration",
    help_triggers("-h", "--help")
)]
pub struct Targets {
    #[argh(positional, description = "the Prometheus config file to evaluate")]
    config_file: PathBuf,

    #[argh(
        option,
        description = "treat the config file as a configmap, the Prometheus config is the data item under this key"
    )]
    configmap_item: Option<String>,

    #[argh(
        option,
        short = 'j',
        long = "job",
        description = "only evaluate the job with this name, can be repeated"
    )]
    jobs: Vec<String>,

    #[argh(
        option,
        short = 's',
        description = "only evaluate target groups whose source matches this regex"
    )]
    source: Option<String>,

    #[argh(switch, description = "print targets dropped by relabeling too")]
    show_dropped: bool,

    #[argh(
        option,
        short = 'o',
        default = "Format::Json",
        description = "output format, json or yaml"
    )]
    output: Format,

    #[argh(
        option,
        default = "default_discovery_timeout()",
        from_str_fn(parse_timeout),
        description = "how long to wait for the first targets of a discovery mechanism, default 5s"
    )]
    discovery_timeout: Duration,
}

impl Targets {
    #![allow(clippy::print_stderr)]
    pub async fn run(&self) -> Result<(), ExitCode> {
        let config = load_config(&self.config_file, self.configmap_item.as_deref())?;

        for job in &self.jobs {
            if config.job(job).is_none() {
                warn!(message = "Job not found in configuration", %job);
            }
        }

        let sources = match &self.source {
            Some(pattern) => SourceFilter::new(pattern).map_err(|err| {
                error!(message = "Invalid source filter", %err);
                exitcode::USAGE
            })?,
            None => SourceFilter::default(),
        };
        let jobs = JobFilter::new(self.jobs.clone());
        let options = DiscoveryOptions {
            timeout: self.discovery_timeout,
        };

        info!(
            message = "Evaluating targets",
            config = ?self.config_file,
            jobs = config.scrape_configs.len(),
            timeout = %format_duration(&options.timeout)
        );

        let shutdown = shutdown_on_signal();
        let log = DiscoveryLog::new();
        let result = evaluate_targets(&config, &jobs, &sources, &options, &shutdown, &log).await;
        log.flush();

        let targets = result.map_err(handle_eval_error)?;

        let printed = Printer::new(std::io::stdout().lock(), self.output)
            .print_targets(&targets, self.show_dropped)
            .map_err(|err| {
                error!(message = "Print targets failed", %err);
                exitcode::IOERR
            })?;

        if printed == 0 {
            eprintln!("No targets found");
        } else {
            eprintln!("Found {printed} targets");
        }

        Ok(())
    }
}
