//! Target implementations

pub mod console;
pub mod file;
pub mod function;
#[cfg(feature = "http")]
pub mod http;
pub mod null;
pub mod rotating_file;

pub use console::ConsoleTarget;
pub use file::{FileSpec, FileStream, FileTarget, LINE_ENDING};
pub use function::{FunctionTarget, TargetFn};
#[cfg(feature = "http")]
pub use http::{HttpOptions, HttpTarget};
pub use null::NullTarget;
pub use rotating_file::{Interval, RotatingFileTarget, RotationPolicy};

pub use crate::core::{Target, TargetContext};
