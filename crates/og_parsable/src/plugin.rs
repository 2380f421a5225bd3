use serde_json::Value;

use crate::encoded::{EncodedMap, PARSABLE_MODULE, PARSABLE_TYPE, TypeTag};
use crate::errors::{ParseError, ParseResult};
use crate::loader::{ModuleLoader, StaticModules};
use crate::parsable::Parsable;
use crate::registry::{PluginEntry, with_registry};

// -----------------------------------------------------------------------------
// DescriptorKeys

/// The per-root-capability pair of field names under which descriptors carry
/// a plugin's type name and, optionally, its module path.
#[derive(Clone, Copy, Debug)]
pub struct DescriptorKeys {
    /// Field holding the type name.
    pub type_key: &'static str,
    /// Field holding the module path; `None` when the root does not declare
    /// one.
    pub module_key: Option<&'static str>,
}

impl Default for DescriptorKeys {
    /// The generic reserved keys of the wire format.
    fn default() -> Self {
        Self {
            type_key: PARSABLE_TYPE,
            module_key: Some(PARSABLE_MODULE),
        }
    }
}

// -----------------------------------------------------------------------------
// Descriptor

/// A plugin descriptor: anything carrying the type identity of the plugin to
/// build, either as a raw map or as a live object whose attributes hold the
/// identity.
#[derive(Clone, Copy)]
pub enum Descriptor<'a> {
    /// A raw JSON map (commonly the encoded map itself).
    Map(&'a EncodedMap),
    /// A live object; the identity is read through its attribute accessors,
    /// honoring presence queries.
    Object(&'a dyn Parsable),
}

// -----------------------------------------------------------------------------
// PluginFactory

/// Resolves type names against the process-wide registry of one root
/// capability and constructs/hydrates instances.
///
/// # Examples
///
/// ```ignore
/// let factory = PluginFactory::new("og_params::Params");
/// let params = factory.construct("SessionParams", None, &args)?;
/// let hydrated = factory.parse(&encoded_map)?;
/// ```
pub struct PluginFactory<'a> {
    root: &'static str,
    keys: DescriptorKeys,
    loader: &'a dyn ModuleLoader,
}

impl PluginFactory<'static> {
    /// A factory over `root` with the default descriptor keys and the
    /// static module loader.
    pub fn new(root: &'static str) -> Self {
        Self {
            root,
            keys: DescriptorKeys::default(),
            loader: &StaticModules,
        }
    }
}

impl<'a> PluginFactory<'a> {
    /// Replace the descriptor key pair.
    #[must_use]
    pub fn with_keys(mut self, keys: DescriptorKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Replace the module loading collaborator.
    #[must_use]
    pub fn with_loader<'b>(self, loader: &'b dyn ModuleLoader) -> PluginFactory<'b> {
        PluginFactory {
            root: self.root,
            keys: self.keys,
            loader,
        }
    }

    /// The root capability this factory resolves under.
    #[inline]
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// The descriptor key pair in effect.
    #[inline]
    pub fn keys(&self) -> DescriptorKeys {
        self.keys
    }

    /// Whether `map` is a still-encoded tagged map under this factory's
    /// type key.
    #[inline]
    pub fn is_tagged(&self, map: &EncodedMap) -> bool {
        map.contains_key(self.keys.type_key)
    }

    /// Resolve `type_name` to a concrete type descriptor.
    ///
    /// Consults the root's registry, refreshing it from the collected
    /// self-registrations on a miss and falling back to a module load when
    /// `module_path` is known.
    pub fn resolve(&self, type_name: &str, module_path: Option<&str>) -> ParseResult<PluginEntry> {
        with_registry(self.root, |registry| {
            registry.resolve(type_name, module_path, self.loader)
        })
    }

    /// Resolve and construct from named initial values.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingRequiredArguments`] when `args` does not cover
    /// the entry's declared required fields;
    /// [`ParseError::UnresolvedPlugin`] when the name cannot be resolved.
    pub fn construct(
        &self,
        type_name: &str,
        module_path: Option<&str>,
        args: &EncodedMap,
    ) -> ParseResult<Box<dyn Parsable>> {
        let entry = self.resolve(type_name, module_path)?;
        self.check_required(&entry, args)?;
        (entry.construct)(args)
    }

    /// Resolve a tagged map and fully hydrate an instance from it.
    ///
    /// The map itself is the descriptor: the type name is read from the
    /// factory's type key, the module path (if present) from the module key.
    pub fn parse(&self, raw: &EncodedMap) -> ParseResult<Box<dyn Parsable>> {
        let tag = TypeTag::extract_with(raw, self.keys.type_key, self.keys.module_key).ok_or_else(|| {
            ParseError::MissingPluginDescriptor {
                key: self.keys.type_key.to_owned(),
                detail: String::from("the map carries no type name"),
            }
            .raised()
        })?;
        self.parse_as(&tag.name, tag.module.as_deref(), raw)
    }

    /// Hydrate an instance of a named type from an encoded map.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnsupportedHydration`] when the resolved entry was
    /// registered for construction only.
    pub fn parse_as(
        &self,
        type_name: &str,
        module_path: Option<&str>,
        raw: &EncodedMap,
    ) -> ParseResult<Box<dyn Parsable>> {
        let entry = self.resolve(type_name, module_path)?;
        self.check_required(&entry, raw)?;
        let Some(hydrate) = entry.hydrate else {
            return Err(ParseError::UnsupportedHydration {
                type_name: type_name.to_owned(),
            }
            .raised());
        };
        hydrate(raw)
    }

    /// Extract the plugin identity from a descriptor and construct.
    pub fn construct_from_descriptor(
        &self,
        descriptor: Descriptor<'_>,
        args: &EncodedMap,
    ) -> ParseResult<Box<dyn Parsable>> {
        let (type_name, module_path) = self.extract_identity(descriptor)?;
        self.construct(&type_name, module_path.as_deref(), args)
    }

    /// Extract the plugin identity from a descriptor and hydrate.
    pub fn parse_from_descriptor(
        &self,
        descriptor: Descriptor<'_>,
        raw: &EncodedMap,
    ) -> ParseResult<Box<dyn Parsable>> {
        let (type_name, module_path) = self.extract_identity(descriptor)?;
        self.parse_as(&type_name, module_path.as_deref(), raw)
    }

    fn check_required(&self, entry: &PluginEntry, args: &EncodedMap) -> ParseResult<()> {
        let missing: Vec<String> = entry
            .required_fields
            .iter()
            .filter(|field| !args.contains_key(**field))
            .map(|field| (*field).to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParseError::MissingRequiredArguments {
                type_name: entry.type_name.to_owned(),
                missing,
            }
            .raised())
        }
    }

    /// Read `(type_name, module_path)` from a descriptor under the
    /// configured field names.
    ///
    /// For live objects the presence queries are honored: a declared key
    /// whose attribute reports unset is as fatal as a missing one.
    fn extract_identity(&self, descriptor: Descriptor<'_>) -> ParseResult<(String, Option<String>)> {
        match descriptor {
            Descriptor::Map(map) => {
                let type_name = self.descriptor_field_from_map(map, self.keys.type_key)?;
                let module_path = match self.keys.module_key {
                    Some(key) => Some(self.descriptor_field_from_map(map, key)?),
                    None => None,
                };
                Ok((type_name, module_path))
            }
            Descriptor::Object(object) => {
                let type_name = self.descriptor_field_from_object(object, self.keys.type_key)?;
                let module_path = match self.keys.module_key {
                    Some(key) => Some(self.descriptor_field_from_object(object, key)?),
                    None => None,
                };
                Ok((type_name, module_path))
            }
        }
    }

    fn descriptor_field_from_map(&self, map: &EncodedMap, key: &str) -> ParseResult<String> {
        match map.get(key) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(other) => Err(ParseError::MissingPluginDescriptor {
                key: key.to_owned(),
                detail: format!("expected a string, got `{other}`"),
            }
            .raised()),
            None => Err(ParseError::MissingPluginDescriptor {
                key: key.to_owned(),
                detail: String::from("the key is absent from the descriptor map"),
            }
            .raised()),
        }
    }

    fn descriptor_field_from_object(&self, object: &dyn Parsable, key: &str) -> ParseResult<String> {
        if object.has_attribute(key) == Some(false) {
            return Err(ParseError::MissingPluginDescriptor {
                key: key.to_owned(),
                detail: String::from("the attribute has not been assigned"),
            }
            .raised());
        }
        let value = object.encode_attribute(key).map_err(|err| {
            ParseError::MissingPluginDescriptor {
                key: key.to_owned(),
                detail: err.to_string(),
            }
            .raised()
        })?;
        match value {
            Value::String(value) => Ok(value),
            other => Err(ParseError::MissingPluginDescriptor {
                key: key.to_owned(),
                detail: format!("expected a string, got `{other}`"),
            }
            .raised()),
        }
    }
}
