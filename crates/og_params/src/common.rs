use serde_json::Value;

use og_parsable::{
    AttributeSchemaBuilder, EncodedMap, ParseError, ParseResult, coerce, encoded, optional,
};

// -----------------------------------------------------------------------------
// ParamsCommon

/// The attributes shared by every parameter type: an interface `version`
/// and a `debug` switch, both optional with presence queries.
///
/// The version should be bumped for every interface change made to a
/// parameter type, so parameter evolution stays trackable alongside
/// evolving data.
///
/// Concrete types embed a `ParamsCommon` and chain their attribute dispatch
/// through it:
///
/// ```ignore
/// fn set_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()> {
///     if let Some(handled) = self.common.set_attribute(name, value) {
///         return handled;
///     }
///     match name {
///         // own attributes...
///     }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamsCommon {
    version: Option<String>,
    debug: Option<bool>,
}

impl ParamsCommon {
    /// The attribute names this embeds into a host schema.
    pub const ATTRIBUTES: &'static [&'static str] = &["version", "debug"];

    /// A schema builder pre-populated with the shared attributes.
    pub fn schema_builder() -> AttributeSchemaBuilder {
        og_parsable::AttributeSchema::builder().serializable(Self::ATTRIBUTES)
    }

    /// Pull the shared attributes out of a construction argument map.
    pub fn from_args(args: &EncodedMap) -> ParseResult<Self> {
        Ok(Self {
            version: optional(args, "version")?,
            debug: optional(args, "debug")?,
        })
    }

    // --- accessors ---

    #[inline]
    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    #[inline]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[inline]
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    #[inline]
    pub fn has_debug(&self) -> bool {
        self.debug.is_some()
    }

    #[inline]
    pub fn debug(&self) -> Option<bool> {
        self.debug
    }

    #[inline]
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = Some(debug);
    }

    // --- dispatch hooks ---

    /// Presence dispatch; `None` when `name` is not a shared attribute.
    pub fn has_attribute(&self, name: &str) -> Option<bool> {
        match name {
            "version" => Some(self.has_version()),
            "debug" => Some(self.has_debug()),
            _ => None,
        }
    }

    /// Encode dispatch; `None` when `name` is not a shared attribute.
    pub fn encode_attribute(&self, name: &str) -> Option<ParseResult<Value>> {
        match name {
            "version" => Some(encoded(&self.version)),
            "debug" => Some(encoded(&self.debug)),
            _ => None,
        }
    }

    /// Setter dispatch; `None` when `name` is not a shared attribute.
    pub fn set_attribute(&mut self, name: &str, value: &Value) -> Option<ParseResult<()>> {
        match name {
            "version" => Some(coerce(name, value).map(|version| self.version = version)),
            "debug" => Some(coerce(name, value).map(|debug| self.debug = debug)),
            _ => None,
        }
    }

    /// The shared attributes never accept non-scalar shapes; surface setter
    /// misuse uniformly.
    pub fn reject_unknown(name: &str) -> ParseError {
        ParseError::UnknownAttribute {
            attribute: name.to_owned(),
        }
    }
}
