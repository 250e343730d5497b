mod error;
mod replay;
mod sondehub;

use std::future::Future;

pub use error::StreamError;
pub use replay::ReplaySource;
pub use sondehub::SondeHubStream;

/// Push-style telemetry feed, pulled one payload at a time.
pub trait ReportSource: Send {
    /// Next raw payload; `None` once the stream has ended.
    fn next_report(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
