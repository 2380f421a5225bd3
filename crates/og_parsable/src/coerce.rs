use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::encoded::EncodedMap;
use crate::errors::{ParseError, ParseResult};
use crate::parsable::{FromArgs, Parsable, decode, take};
use crate::plugin::PluginFactory;

// -----------------------------------------------------------------------------
// Scalar coercion

/// Coerce a raw JSON value into `T` for the attribute's setter.
///
/// # Errors
///
/// [`ParseError::TypeMismatch`] when the value's shape does not fit.
pub fn coerce<T: DeserializeOwned>(attribute: &str, value: &Value) -> ParseResult<T> {
    serde_json::from_value(value.clone()).map_err(|err| {
        ParseError::TypeMismatch {
            attribute: attribute.to_owned(),
            detail: err.to_string(),
        }
        .raised()
    })
}

/// The encoded (JSON-compatible) form of a live value; array-like and
/// set-like values flatten to plain sequences.
pub fn encoded<T: Serialize>(value: &T) -> ParseResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Pull a required construction field out of an argument map.
///
/// # Errors
///
/// [`ParseError::MissingRequiredArguments`] when the field is absent,
/// [`ParseError::TypeMismatch`] when it has the wrong shape.
pub fn required<T: DeserializeOwned>(args: &EncodedMap, name: &str) -> ParseResult<T> {
    match args.get(name) {
        Some(value) => coerce(name, value),
        None => Err(ParseError::MissingRequiredArguments {
            type_name: String::new(),
            missing: vec![name.to_owned()],
        }
        .raised()),
    }
}

/// Pull an optional construction field out of an argument map.
///
/// An absent key and an explicit `null` both come back as `None`,
/// matching the never-set state of an optional attribute.
pub fn optional<T: DeserializeOwned>(args: &EncodedMap, name: &str) -> ParseResult<Option<T>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce(name, value).map(Some),
    }
}

// -----------------------------------------------------------------------------
// Enum coercion

/// The domain declaration implemented by every enum attribute type.
///
/// # Examples
///
/// ```
/// use og_parsable::ParsableEnum;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Mode {
///     Training,
///     Inference,
/// }
///
/// impl ParsableEnum for Mode {
///     const DOMAIN: &'static [(&'static str, Self)] =
///         &[("Training", Mode::Training), ("Inference", Mode::Inference)];
/// }
///
/// assert_eq!(Mode::Training.symbol(), "Training");
/// assert_eq!(Mode::from_symbol("Inference"), Some(Mode::Inference));
/// assert_eq!(Mode::from_index(0), Some(Mode::Training));
/// ```
pub trait ParsableEnum: Sized + Copy + PartialEq + 'static {
    /// The symbolic names of the domain, in ordinal order.
    const DOMAIN: &'static [(&'static str, Self)];

    /// The symbolic name of this value.
    fn symbol(&self) -> &'static str {
        Self::DOMAIN
            .iter()
            .find(|(_, value)| value == self)
            .map(|(symbol, _)| *symbol)
            .expect("enum value missing from its own DOMAIN declaration")
    }

    /// Resolve a symbolic name.
    fn from_symbol(symbol: &str) -> Option<Self> {
        Self::DOMAIN
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|(_, value)| *value)
    }

    /// Resolve an ordinal index.
    fn from_index(index: usize) -> Option<Self> {
        Self::DOMAIN.get(index).map(|(_, value)| *value)
    }
}

/// Resolve a raw JSON value (symbolic name or ordinal index) against an
/// enum's domain.
///
/// # Errors
///
/// [`ParseError::EnumDomainError`] for values outside the domain.
pub fn enum_from_value<E: ParsableEnum>(attribute: &str, value: &Value) -> ParseResult<E> {
    let resolved = match value {
        Value::String(symbol) => E::from_symbol(symbol),
        Value::Number(number) => number
            .as_u64()
            .and_then(|index| usize::try_from(index).ok())
            .and_then(E::from_index),
        _ => None,
    };
    resolved.ok_or_else(|| {
        ParseError::EnumDomainError {
            attribute: attribute.to_owned(),
            value: value.to_string(),
        }
        .raised()
    })
}

// -----------------------------------------------------------------------------
// Parse on assignment

/// The outcome of element-wise resolution: either a value left as it
/// arrived or a fully hydrated parsable.
#[derive(Debug)]
pub enum Hydrated {
    /// The value was not a tagged map (or resolution was waived) and passes
    /// through unchanged.
    Raw(Value),
    /// The value was a tagged map and was resolved to its concrete type.
    Parsed(Box<dyn Parsable>),
}

impl Hydrated {
    /// Take the concrete value out, failing with
    /// [`ParseError::TypeMismatch`] when this is a raw value or a different
    /// concrete type.
    pub fn take<T: Parsable>(self, attribute: &str) -> ParseResult<T> {
        match self {
            Hydrated::Parsed(boxed) => take(boxed).map_err(|_| {
                ParseError::TypeMismatch {
                    attribute: attribute.to_owned(),
                    detail: String::from("hydrated value has a different concrete type"),
                }
                .raised()
            }),
            Hydrated::Raw(value) => Err(ParseError::TypeMismatch {
                attribute: attribute.to_owned(),
                detail: format!("value `{value}` is not an encoded parsable"),
            }
            .raised()),
        }
    }
}

/// Resolve a raw value through the factory when it is a tagged map.
///
/// Untagged values pass through unchanged. With `strict` unset, resolution
/// failures also pass the input through unchanged (they are still logged at
/// the failure site); with `strict` set they propagate.
pub fn parse_value(factory: &PluginFactory<'_>, value: &Value, strict: bool) -> ParseResult<Hydrated> {
    let Value::Object(map) = value else {
        return Ok(Hydrated::Raw(value.clone()));
    };
    if !factory.is_tagged(map) {
        return Ok(Hydrated::Raw(value.clone()));
    }
    match factory.parse(map) {
        Ok(parsed) => Ok(Hydrated::Parsed(parsed)),
        Err(err) if strict => Err(err),
        Err(_) => Ok(Hydrated::Raw(value.clone())),
    }
}

/// Setter-side hydration of a single nested-object attribute.
///
/// A tagged map resolves through the factory (and must come out as `T`);
/// an untagged map hydrates directly as `T`, covering setters whose target
/// type is statically known.
pub fn assign_parsable<T: Parsable + FromArgs>(
    factory: &PluginFactory<'_>,
    attribute: &str,
    value: &Value,
) -> ParseResult<T> {
    let Value::Object(map) = value else {
        return Err(ParseError::TypeMismatch {
            attribute: attribute.to_owned(),
            detail: format!("expected an encoded object, got `{value}`"),
        }
        .raised());
    };
    if factory.is_tagged(map) {
        parse_value(factory, value, true)?.take(attribute)
    } else {
        let mut output = T::from_args(map)?;
        decode(&mut output, map)?;
        Ok(output)
    }
}

/// Element-wise resolution of a map value: tagged entries are parsed,
/// untagged entries pass through unchanged.
pub fn parsed_map(factory: &PluginFactory<'_>, map: &EncodedMap) -> ParseResult<Vec<(String, Hydrated)>> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), parse_value(factory, value, true)?)))
        .collect()
}

/// Element-wise resolution of a sequence value: tagged elements are parsed,
/// untagged elements pass through unchanged.
pub fn parsed_list(factory: &PluginFactory<'_>, items: &[Value]) -> ParseResult<Vec<Hydrated>> {
    items
        .iter()
        .map(|value| parse_value(factory, value, true))
        .collect()
}

/// Setter-side hydration of a whole map-of-nested-object attribute into a
/// typed collection.
pub fn collect_map_of<T: Parsable + FromArgs>(
    factory: &PluginFactory<'_>,
    attribute: &str,
    value: &Value,
) -> ParseResult<BTreeMap<String, T>> {
    let Value::Object(map) = value else {
        return Err(ParseError::TypeMismatch {
            attribute: attribute.to_owned(),
            detail: format!("expected a map of encoded objects, got `{value}`"),
        }
        .raised());
    };
    map.iter()
        .map(|(key, element)| Ok((key.clone(), assign_parsable(factory, attribute, element)?)))
        .collect()
}

/// Setter-side hydration of a whole sequence-of-nested-object attribute
/// into a typed collection.
pub fn collect_seq_of<T: Parsable + FromArgs>(
    factory: &PluginFactory<'_>,
    attribute: &str,
    value: &Value,
) -> ParseResult<Vec<T>> {
    let Value::Array(items) = value else {
        return Err(ParseError::TypeMismatch {
            attribute: attribute.to_owned(),
            detail: format!("expected a sequence of encoded objects, got `{value}`"),
        }
        .raised());
    };
    items
        .iter()
        .map(|element| assign_parsable(factory, attribute, element))
        .collect()
}
