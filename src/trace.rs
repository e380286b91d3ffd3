use tracing_subscriber::EnvFilter;

/// Crates whose logs are shown for a plain level like `info`.
const CRATES: [&str; 3] = ["promeval", "labels", "relabel"];

/// Expand a plain level into per crate directives, anything else is taken as
/// a filter directive already.
pub fn directives(level: &str) -> String {
    match level {
        "off" => "off".to_string(),
        "trace" | "debug" | "info" | "warn" | "error" => CRATES
            .iter()
            .map(|name| format!("{name}={level}"))
            .collect::<Vec<_>>()
            .join(","),
        directives => directives.to_string(),
    }
}

/// Install the global subscriber, logs are written to stderr so stdout only
/// carries the evaluated result.
#[allow(clippy::print_stderr)]
pub fn init(color: bool, levels: &str) {
    let filter = match EnvFilter::try_new(levels) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("Invalid log filter {levels:?}, {err}");
            EnvFilter::new(directives("warn"))
        }
    };

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = result {
        eprintln!("Install tracing subscriber failed, {err}");
    }
}
