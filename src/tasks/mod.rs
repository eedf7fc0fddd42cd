//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - Persistent sweep: Removes expired persistent entries at startup and
//!   at a configured interval

mod sweep;

pub use sweep::{run_startup_sweep, spawn_sweep_task};
