#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![doc = include_str!("../README.md")]

mod error;
pub use error::*;

mod ptr;
pub use ptr::*;

mod types;
pub use types::*;

mod registry;
pub use registry::*;

mod var;
pub use var::*;

mod owned;
pub use owned::*;

pub mod text;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace, warn as warning};

#[cfg(not(feature = "tracing"))]
#[macro_export]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[macro_export]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[macro_export]
/// Forwards to tracing::warn when the tracing feature is enabled
macro_rules! warning {
    ($($tt:tt)*) => {};
}
