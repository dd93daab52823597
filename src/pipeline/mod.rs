//! Producer/Consumer Window Pipeline
//! =================================
//!
//! The wrapper around the assembly core: reference windows flow in
//! through a lock-free MPMC queue, a fixed worker pool assembles them
//! independently, and variants plus completion records flow out through
//! the shared store and a blocking result channel.

pub mod processor;
pub mod scheduler;
pub mod window;

pub use processor::{ReadProvider, StaticReadProvider, WindowProcessor};
pub use scheduler::WindowScheduler;
pub use window::{RefWindow, WindowQueue, WindowResult};
