mod commands;
mod launch;

use crate::launch::RootCommand;

fn main() {
    let root: RootCommand = argh::from_env();

    if let Err(code) = root.run() {
        std::process::exit(code);
    }
}
