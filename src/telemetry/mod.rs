mod error;
mod processor;
mod report;
mod track;

pub use processor::{AlertMatch, Outcome, Processor};
