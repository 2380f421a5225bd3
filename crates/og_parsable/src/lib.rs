#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod coerce;
mod encoded;
mod errors;
mod loader;
mod parsable;
mod plugin;
mod registry;
mod schema;

pub mod io;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use coerce::{
    Hydrated, ParsableEnum, assign_parsable, coerce, collect_map_of, collect_seq_of, encoded,
    enum_from_value, optional, parse_value, parsed_list, parsed_map, required,
};
pub use encoded::{EncodedMap, PARSABLE_MODULE, PARSABLE_TYPE, TypeTag, is_tagged_map};
pub use errors::{ParseError, ParseResult};
pub use loader::{ModuleDef, ModuleLoader, StaticModules};
pub use parsable::{FromArgs, Parsable, decode, encode, equals, take, update};
pub use plugin::{Descriptor, DescriptorKeys, PluginFactory};
pub use registry::{Plugin, PluginEntry, PluginRegistration, PluginRegistry};
pub use schema::{AttributeSchema, AttributeSchemaBuilder, Category};

// -----------------------------------------------------------------------------
// Macro support

// Consumers of `register_plugin!` / `register_module!` should not need their
// own `inventory` dependency.
#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
