//! Client harness: one exchange per connection, batches collected in order

pub mod batch;
pub mod exchange;

pub use batch::{send_many, Exchange};
pub use exchange::{Probe, Target};
