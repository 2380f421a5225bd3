use std::borrow::Cow;

use serde_json::Value;

// -----------------------------------------------------------------------------
// Reserved keys

/// Default reserved key holding the concrete type name of an encoded object.
pub const PARSABLE_TYPE: &str = "parsable_type";

/// Default reserved key holding the module path of an encoded object.
pub const PARSABLE_MODULE: &str = "parsable_module";

// -----------------------------------------------------------------------------
// EncodedMap

/// The wire representation of an encoded object.
///
/// A JSON-compatible map from attribute names to their encoded values, always
/// containing the [`TypeTag`] keys. An optional attribute that was never set
/// is *absent* from the map, not present with a null value; that is how
/// "never set" stays distinguishable from "set to empty" end to end.
pub type EncodedMap = serde_json::Map<String, Value>;

// -----------------------------------------------------------------------------
// TypeTag

/// The `(type_name, module_path)` pair identifying which concrete type an
/// [`EncodedMap`] represents.
///
/// # Examples
///
/// ```
/// use og_parsable::TypeTag;
///
/// let mut map = og_parsable::EncodedMap::new();
/// TypeTag::of("Point", "geo").embed(&mut map);
///
/// let tag = TypeTag::extract(&map).unwrap();
/// assert_eq!(tag.name, "Point");
/// assert_eq!(tag.module.as_deref(), Some("geo"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeTag {
    /// The concrete type name, e.g. `Point`.
    pub name: Cow<'static, str>,
    /// The module path under which the type name resolves, e.g. `geo`.
    pub module: Option<Cow<'static, str>>,
}

impl TypeTag {
    /// Create a tag from static identity strings (the usual case for
    /// `Parsable::type_tag` implementations).
    #[inline]
    pub const fn of(name: &'static str, module: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            module: Some(Cow::Borrowed(module)),
        }
    }

    /// Write the reserved tag keys into `output`.
    pub fn embed(&self, output: &mut EncodedMap) {
        output.insert(
            PARSABLE_TYPE.to_owned(),
            Value::String(self.name.clone().into_owned()),
        );
        if let Some(module) = &self.module {
            output.insert(
                PARSABLE_MODULE.to_owned(),
                Value::String(module.clone().into_owned()),
            );
        }
    }

    /// Read a tag back from an encoded map using the default reserved keys.
    ///
    /// Returns `None` when the map carries no type name; a missing module
    /// path alone does not make the map untagged.
    pub fn extract(input: &EncodedMap) -> Option<Self> {
        Self::extract_with(input, PARSABLE_TYPE, Some(PARSABLE_MODULE))
    }

    /// Read a tag using configured reserved key names.
    pub fn extract_with(input: &EncodedMap, type_key: &str, module_key: Option<&str>) -> Option<Self> {
        let name = input.get(type_key)?.as_str()?;
        let module = module_key
            .and_then(|key| input.get(key))
            .and_then(Value::as_str)
            .map(|module| Cow::Owned(module.to_owned()));
        Some(Self {
            name: Cow::Owned(name.to_owned()),
            module,
        })
    }
}

/// Whether `value` is a still-encoded tagged map (the tagged-union test used
/// by setters before storing an assigned value).
#[inline]
pub fn is_tagged_map(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key(PARSABLE_TYPE))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{EncodedMap, TypeTag, is_tagged_map};

    #[test]
    fn embed_extract_round_trip() {
        let mut map = EncodedMap::new();
        TypeTag::of("Point", "geo").embed(&mut map);
        assert_eq!(TypeTag::extract(&map), Some(TypeTag::of("Point", "geo")));
    }

    #[test]
    fn extract_tolerates_missing_module() {
        let mut map = EncodedMap::new();
        map.insert("parsable_type".into(), Value::String("Point".into()));
        let tag = TypeTag::extract(&map).unwrap();
        assert_eq!(tag.name, "Point");
        assert_eq!(tag.module, None);
    }

    #[test]
    fn tagged_map_test() {
        assert!(is_tagged_map(&json!({"parsable_type": "Point"})));
        assert!(!is_tagged_map(&json!({"x": 1.0})));
        assert!(!is_tagged_map(&json!([1, 2, 3])));
    }
}
