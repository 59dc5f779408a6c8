// Application layer - the analytics pipeline and its entry points:
// normalize raw records, filter by range, group, derive metrics, build reports.

pub mod error;
pub mod grouping;
pub mod metrics;
pub mod normalize;
pub mod reporting;
pub mod service;

pub use error::*;
pub use grouping::*;
pub use metrics::*;
pub use normalize::*;
pub use reporting::*;
pub use service::*;
