//! Infrastructure adapters backing the admission controller.

pub mod queue;
pub use queue::WaitQueue;
