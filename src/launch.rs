use std::io::IsTerminal;
use std::time::Duration;

use argh::FromArgs;
use exitcode::ExitCode;
use tracing::error;

use crate::commands::SubCommands;

#[derive(FromArgs)]
#[argh(
    description = "Evaluate Prometheus scrape configurations offline, and print the targets they would produce",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"warn\".to_string()",
        description = "log level, overridden by the PROMEVAL_LOG environment variable"
    )]
    log_level: String,

    #[argh(subcommand)]
    sub_commands: Option<SubCommands>,
}

impl RootCommand {
    #![allow(clippy::print_stdout, clippy::print_stderr)]
    fn show_version(&self) {
        println!("promeval {}", env!("CARGO_PKG_VERSION"));
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        let Some(sub_command) = &self.sub_commands else {
            eprintln!("No command specified, run with --help for usage");
            return Err(exitcode::USAGE);
        };

        let levels = std::env::var("PROMEVAL_LOG")
            .unwrap_or_else(|_| promeval::trace::directives(&self.log_level));
        let color = std::io::stderr().is_terminal();
        promeval::trace::init(color, &levels);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("promeval-worker")
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(message = "Build tokio runtime failed", %err);
                exitcode::OSERR
            })?;

        let result = runtime.block_on(sub_command.run());

        // blocking file reads might still be running
        runtime.shutdown_timeout(Duration::from_secs(1));

        result
    }
}
