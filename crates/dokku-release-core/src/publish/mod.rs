//! Package publishing.
//!
//! - `client`: the publishing service seam and its `package_cloud` client
//! - `fanout`: catalog expansion and failure-isolated push fan-out

pub mod client;
pub mod fanout;

pub use client::{PackageCloudPublisher, PackagePublisher, PublishError};
pub use fanout::{FanoutEngine, PublishOutcome, PublishResult};
