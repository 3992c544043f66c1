//! The descriptors the registry hands out: metadata records, properties,
//! functions, and the traits leaf types implement.

mod meta;
pub use meta::*;

mod property;
pub use property::*;

mod function;
pub use function::*;

mod scalar;
pub use scalar::*;
