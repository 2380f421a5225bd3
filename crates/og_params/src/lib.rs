#![doc = include_str!("../README.md")]

use og_parsable::Parsable;

// -----------------------------------------------------------------------------
// Modules

mod common;
mod manage;

// -----------------------------------------------------------------------------
// Top-level exports

pub use common::ParamsCommon;
pub use manage::{
    ParamsArgs, copy_with, create_params, create_params_pickled, params_factory,
    temporary_directory,
};

// -----------------------------------------------------------------------------
// Root capability

/// The root capability name every parameter type registers under.
pub const PARAMS_ROOT: &str = "og_params::Params";

/// Marker capability for configurable input parameters.
///
/// Concrete types implement [`Parsable`] as usual, embed a
/// [`ParamsCommon`] for the shared attributes and register with
///
/// ```ignore
/// register_plugin!(og_params::PARAMS_ROOT, SessionParams);
/// ```
pub trait Params: Parsable {}
