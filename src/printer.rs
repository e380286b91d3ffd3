use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::target::Target;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("write output failed, {0}")]
    Io(#[from] std::io::Error),
    #[error("encode json failed, {0}")]
    Json(#[from] serde_json::Error),
    #[error("encode yaml failed, {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(format!("unknown output format {s:?}, json or yaml expected")),
        }
    }
}

pub struct Printer<W> {
    writer: W,
    format: Format,
}

impl<W: Write> Printer<W> {
    pub fn new(writer: W, format: Format) -> Self {
        Self { writer, format }
    }

    pub fn print<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut self.writer, value)?;
                self.writer.write_all(b"\n")?;
            }
            Format::Yaml => serde_yaml::to_writer(&mut self.writer, value)?,
        }

        self.writer.flush()?;

        Ok(())
    }

    /// Print targets as one list, dropped targets are skipped unless
    /// `show_dropped` is set. The number of printed targets is returned.
    pub fn print_targets(&mut self, targets: &[Target], show_dropped: bool) -> Result<usize, Error> {
        let visible = targets
            .iter()
            .filter(|target| show_dropped || !target.is_dropped())
            .collect::<Vec<_>>();

        if visible.is_empty() {
            return Ok(0);
        }

        self.print(&visible)?;

        Ok(visible.len())
    }
}
