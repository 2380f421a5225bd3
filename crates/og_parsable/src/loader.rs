use crate::errors::{ParseError, ParseResult};
use crate::registry::PluginEntry;

// -----------------------------------------------------------------------------
// ModuleDef

/// A loadable module: a named bundle of plugin entries.
///
/// Every module ships its entries at program start via
/// [`register_module!`](crate::register_module) and is looked up by path on
/// demand. Loading is the cold-cache fallback of plugin resolution: the
/// registry only asks for a module when a type name cannot be resolved from
/// what is already registered.
pub struct ModuleDef {
    /// The path under which the module is addressable, e.g. `geo`.
    pub path: &'static str,
    /// Produce the module's plugin entries.
    pub provide: fn() -> Vec<PluginEntry>,
}

inventory::collect!(ModuleDef);

/// Declare a loadable module providing the listed plugin types.
///
/// ```ignore
/// register_module!("geo", [Point, Segment]);
/// ```
#[macro_export]
macro_rules! register_module {
    ($path:expr, [$($ty:ty),* $(,)?]) => {
        $crate::__private::inventory::submit! {
            $crate::ModuleDef {
                path: $path,
                provide: || ::std::vec![$($crate::PluginEntry::of::<$ty>()),*],
            }
        }
    };
}

// -----------------------------------------------------------------------------
// ModuleLoader

/// The module loading collaborator consumed by plugin resolution.
///
/// Synchronous and blocking. A failed load surfaces from the resolution
/// path as [`ParseError::UnresolvedPlugin`] naming the type and module that
/// were being resolved.
pub trait ModuleLoader {
    /// Load the module at `path` and return its plugin entries.
    fn load(&self, path: &str) -> ParseResult<Vec<PluginEntry>>;

    /// Fetch a single named member from the module at `path`.
    fn member(&self, path: &str, type_name: &str) -> ParseResult<PluginEntry> {
        let entries = self.load(path)?;
        entries
            .into_iter()
            .find(|entry| entry.type_name == type_name)
            .ok_or_else(|| {
                ParseError::UnresolvedPlugin {
                    type_name: type_name.to_owned(),
                    module_path: Some(path.to_owned()),
                }
                .raised()
            })
    }
}

/// The default loader over the statically registered [`ModuleDef`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticModules;

impl ModuleLoader for StaticModules {
    fn load(&self, path: &str) -> ParseResult<Vec<PluginEntry>> {
        for module in inventory::iter::<ModuleDef> {
            if module.path == path {
                return Ok((module.provide)());
            }
        }
        Err(ParseError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("module `{path}` is not registered"),
        )))
    }
}
