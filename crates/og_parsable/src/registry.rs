use std::sync::{LazyLock, Mutex, PoisonError};

use og_utils::hash::HashMap;

use crate::encoded::EncodedMap;
use crate::errors::{ParseError, ParseResult};
use crate::loader::ModuleLoader;
use crate::parsable::{FromArgs, Parsable, decode};

// -----------------------------------------------------------------------------
// Plugin

/// Static identity of a registrable concrete type.
///
/// Registration never inspects the type at runtime; everything the registry
/// needs is declared here, including the explicit list of construction
/// fields that must be present in the argument map.
///
/// # Examples
///
/// ```ignore
/// impl Plugin for Point {
///     const TYPE_NAME: &'static str = "Point";
///     const MODULE_PATH: &'static str = "geo";
///     const REQUIRED_FIELDS: &'static [&'static str] = &["x", "y"];
/// }
///
/// register_plugin!("geo::Shape", Point);
/// ```
pub trait Plugin: Parsable + FromArgs {
    /// The name under which this type resolves.
    const TYPE_NAME: &'static str;

    /// The module path that provides this type.
    const MODULE_PATH: &'static str;

    /// Construction fields that callers must supply.
    const REQUIRED_FIELDS: &'static [&'static str] = &[];
}

// -----------------------------------------------------------------------------
// PluginEntry

fn construct_erased<T: Plugin>(args: &EncodedMap) -> ParseResult<Box<dyn Parsable>> {
    Ok(Box::new(T::from_args(args)?))
}

fn hydrate_erased<T: Plugin>(raw: &EncodedMap) -> ParseResult<Box<dyn Parsable>> {
    let mut value = T::from_args(raw)?;
    decode(&mut value, raw)?;
    Ok(Box::new(value))
}

/// A registry entry: the concrete type descriptor a type name resolves to.
///
/// Entries are plain data (fn pointers plus static strings), cheap to copy
/// out of the registry.
#[derive(Clone, Copy)]
pub struct PluginEntry {
    /// The name under which the entry is indexed.
    pub type_name: &'static str,
    /// The module path that provides the type.
    pub module_path: &'static str,
    /// Construction fields that must be covered by the supplied arguments.
    pub required_fields: &'static [&'static str],
    /// Construct from named initial values.
    pub construct: fn(&EncodedMap) -> ParseResult<Box<dyn Parsable>>,
    /// Construct and fully hydrate from an encoded map. `None` for entries
    /// registered for construction only.
    pub hydrate: Option<fn(&EncodedMap) -> ParseResult<Box<dyn Parsable>>>,
}

impl PluginEntry {
    /// The entry for a hydratable plugin type.
    pub const fn of<T: Plugin>() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            module_path: T::MODULE_PATH,
            required_fields: T::REQUIRED_FIELDS,
            construct: construct_erased::<T>,
            hydrate: Some(hydrate_erased::<T>),
        }
    }

    /// The entry for a plugin type that only supports construction.
    pub const fn construct_only<T: Plugin>() -> Self {
        Self {
            hydrate: None,
            ..Self::of::<T>()
        }
    }
}

impl core::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("type_name", &self.type_name)
            .field("module_path", &self.module_path)
            .field("required_fields", &self.required_fields)
            .field("hydrate", &self.hydrate.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PluginRegistration

/// A self-registration record collected at program start.
///
/// Submitted by [`register_plugin!`](crate::register_plugin); the `root`
/// names the capability whose registry should pick the entry up.
pub struct PluginRegistration {
    /// The root capability this registration belongs to.
    pub root: &'static str,
    /// The registered entry.
    pub entry: PluginEntry,
}

impl PluginRegistration {
    #[inline]
    pub const fn new(root: &'static str, entry: PluginEntry) -> Self {
        Self { root, entry }
    }
}

inventory::collect!(PluginRegistration);

/// Register a concrete type into the registry of a root capability.
///
/// Expands to a static submission; the entry becomes visible to the root's
/// registry on its next refresh. The `construct_only` form registers an
/// entry without hydration support.
///
/// ```ignore
/// register_plugin!("og_params::Params", SessionParams);
/// register_plugin!("workers::Worker", CsvWorker, construct_only);
/// ```
#[macro_export]
macro_rules! register_plugin {
    ($root:expr, $ty:ty) => {
        $crate::__private::inventory::submit! {
            $crate::PluginRegistration::new($root, $crate::PluginEntry::of::<$ty>())
        }
    };
    ($root:expr, $ty:ty, construct_only) => {
        $crate::__private::inventory::submit! {
            $crate::PluginRegistration::new($root, $crate::PluginEntry::construct_only::<$ty>())
        }
    };
}

// -----------------------------------------------------------------------------
// PluginRegistry

/// The per-root-capability registry mapping type names to concrete type
/// descriptors.
///
/// Entries are append-only and lazily populated: a lookup miss triggers a
/// refresh over the collected self-registrations, then a module-load
/// fallback when a module path is known. Entries for types whose modules
/// are never touched again are kept for the process lifetime (a known
/// limitation, never a correctness issue: a given name always resolves to
/// the same concrete type).
pub struct PluginRegistry {
    root: &'static str,
    entries: HashMap<&'static str, PluginEntry>,
}

impl PluginRegistry {
    /// An empty registry for `root`.
    pub fn new(root: &'static str) -> Self {
        Self {
            root,
            entries: og_utils::default(),
        }
    }

    /// The root capability this registry serves.
    #[inline]
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// Whether `type_name` is currently registered.
    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Look up a registered entry without refreshing.
    #[inline]
    pub fn get(&self, type_name: &str) -> Option<&PluginEntry> {
        self.entries.get(type_name)
    }

    /// Number of registered entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Merge every collected self-registration for this root, append-only.
    pub fn refresh(&mut self) {
        for registration in inventory::iter::<PluginRegistration> {
            if registration.root == self.root {
                self.entries
                    .entry(registration.entry.type_name)
                    .or_insert(registration.entry);
            }
        }
    }

    /// Merge a batch of entries (from a loaded module), append-only.
    pub fn merge(&mut self, entries: &[PluginEntry]) {
        for entry in entries {
            self.entries.entry(entry.type_name).or_insert(*entry);
        }
    }

    /// Resolve `type_name` to a registered entry.
    ///
    /// Lookup order: the current registry, a refresh over the collected
    /// self-registrations, then (when a module path is known) the module
    /// loader. Entries provided by a loaded module are merged before
    /// returning so that newly loaded subtypes become resolvable too.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnresolvedPlugin`] when the name stays unknown.
    pub fn resolve(
        &mut self,
        type_name: &str,
        module_path: Option<&str>,
        loader: &dyn ModuleLoader,
    ) -> ParseResult<PluginEntry> {
        if let Some(entry) = self.get(type_name) {
            return Ok(*entry);
        }

        self.refresh();
        if let Some(entry) = self.get(type_name) {
            return Ok(*entry);
        }

        let Some(path) = module_path else {
            return Err(ParseError::UnresolvedPlugin {
                type_name: type_name.to_owned(),
                module_path: None,
            }
            .raised());
        };

        let entries = match loader.load(path) {
            Ok(entries) => entries,
            Err(_) => {
                return Err(ParseError::UnresolvedPlugin {
                    type_name: type_name.to_owned(),
                    module_path: Some(path.to_owned()),
                }
                .raised());
            }
        };
        self.merge(&entries);
        // A loaded module may self-register further types for this root.
        self.refresh();

        match self.get(type_name) {
            Some(entry) => Ok(*entry),
            None => Err(ParseError::UnresolvedPlugin {
                type_name: type_name.to_owned(),
                module_path: Some(path.to_owned()),
            }
            .raised()),
        }
    }
}

// -----------------------------------------------------------------------------
// Process-wide cache

static REGISTRIES: LazyLock<Mutex<HashMap<&'static str, PluginRegistry>>> =
    LazyLock::new(|| Mutex::new(og_utils::default()));

/// Run `operate` against the process-wide registry of `root`.
///
/// The cache is the only shared mutable state of the engine; the single
/// mutex also guards the non-atomic refresh-then-merge sequence inside
/// [`PluginRegistry::resolve`].
pub(crate) fn with_registry<R>(
    root: &'static str,
    operate: impl FnOnce(&mut PluginRegistry) -> R,
) -> R {
    let mut registries = REGISTRIES.lock().unwrap_or_else(PoisonError::into_inner);
    let registry = registries
        .entry(root)
        .or_insert_with(|| PluginRegistry::new(root));
    operate(registry)
}
