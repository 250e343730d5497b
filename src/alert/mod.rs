mod criterion;
mod ledger;

pub use criterion::Criterion;
pub use ledger::AlertLedger;
