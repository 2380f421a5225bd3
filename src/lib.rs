#![doc = include_str!("../README.md")]

pub use og_params as params;
pub use og_parsable as parsable;
pub use og_utils as utils;
