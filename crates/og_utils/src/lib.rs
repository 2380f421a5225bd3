#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod default;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use default::default;
