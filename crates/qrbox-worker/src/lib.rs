//! Background detection execution, decoupled from the request path.

mod queue;

pub use queue::{DetectionQueue, QueueError};
