//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Flush: Lands throttled repository writes deferred at the end of a burst

mod flush;

pub use flush::spawn_flush_task;
