pub mod aggregator;

pub use aggregator::{HIGH_CONFIDENCE_PERCENT, SessionState, SessionStatus};
