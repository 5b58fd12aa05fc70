//! Sliding-window rate limiting over a per-key event log.

mod backend;
mod clock;
mod limiter;
mod memory;
mod policy;

pub use backend::EventLog;
pub use clock::{Clock, MockClock, SystemClock};
pub use limiter::{Admission, RateLimiter};
pub use memory::MemoryEventLog;
pub use policy::RateLimitPolicy;
