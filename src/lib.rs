#[macro_use]
extern crate tracing;

pub mod config;
pub mod discovery;
pub mod duration;
pub mod eval;
pub mod filter;
pub mod printer;
pub mod target;
pub mod trace;

pub use eval::{RelabelResult, evaluate_relabel, evaluate_targets};
