//! Channel abstraction for activity I/O.

pub mod console;

pub use console::{ActivityStream, ConsoleChannel, ConsoleSink};
