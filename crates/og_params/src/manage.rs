use serde::de::DeserializeOwned;
use serde_json::Value;

use og_parsable::{
    EncodedMap, Parsable, ParseError, ParseResult, PluginFactory, decode, io, update,
};

use crate::PARAMS_ROOT;

// -----------------------------------------------------------------------------
// Factory

/// A plugin factory over the [`PARAMS_ROOT`](crate::PARAMS_ROOT) capability.
pub fn params_factory() -> PluginFactory<'static> {
    PluginFactory::new(PARAMS_ROOT)
}

// -----------------------------------------------------------------------------
// Creation

/// The argument source accepted by [`create_params`].
#[derive(Clone, Copy)]
pub enum ParamsArgs<'a> {
    /// Already-parsed named values.
    Map(&'a EncodedMap),
    /// A JSON document holding the named values.
    Json(&'a str),
}

impl ParamsArgs<'_> {
    fn into_map(self) -> ParseResult<EncodedMap> {
        match self {
            ParamsArgs::Map(map) => Ok(map.clone()),
            ParamsArgs::Json(text) => match io::from_json_str(text)? {
                Value::Object(map) => Ok(map),
                other => Err(ParseError::TypeMismatch {
                    attribute: String::from("arguments"),
                    detail: format!("expected a JSON object of named values, got `{other}`"),
                }
                .raised()),
            },
        }
    }
}

/// Create a registered parameter type by name.
///
/// With `parse_instead_of_construct` unset, the arguments feed the type's
/// constructor directly. When set, the type is constructed bare and the
/// arguments are applied as a full hydration pass afterwards, the route to
/// take when the arguments are an encoded map rather than constructor
/// values.
pub fn create_params(
    type_name: &str,
    arguments: ParamsArgs<'_>,
    parse_instead_of_construct: bool,
) -> ParseResult<Box<dyn Parsable>> {
    let map = arguments.into_map()?;
    let factory = params_factory();
    if parse_instead_of_construct {
        let mut output = factory.construct(type_name, None, &EncodedMap::new())?;
        decode(output.as_mut(), &map)?;
        Ok(output)
    } else {
        factory.construct(type_name, None, &map)
    }
}

/// Reload a parameter value from a pickled (full-fidelity) dump.
///
/// The dump must have been produced by a matching implementation/version;
/// see [`og_parsable::io::to_pickled_json`].
pub fn create_params_pickled<T: DeserializeOwned>(json: &str) -> ParseResult<T> {
    io::from_pickled_json(json)
}

// -----------------------------------------------------------------------------
// Manipulation

/// Copy a parameter value and selectively update the copy.
///
/// With `only_if_missing`, overrides only fill attributes the copy does not
/// have set yet; otherwise they overwrite.
pub fn copy_with<T: Parsable + Clone>(
    params: &T,
    only_if_missing: bool,
    overrides: &EncodedMap,
) -> ParseResult<T> {
    let mut copied = params.clone();
    update(&mut copied, only_if_missing, overrides)?;
    Ok(copied)
}

// -----------------------------------------------------------------------------
// Working directories

/// A unique path string for a temporary working directory, without creating
/// anything on the filesystem: `<tmp>/<folder>/<timestamp>`.
pub fn temporary_directory(folder: &str) -> String {
    format!(
        "{}/{}/{}",
        io::temp_dir().display(),
        folder,
        io::timestamp_string()
    )
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};

    use og_parsable::{
        AttributeSchema, EncodedMap, FromArgs, Parsable, ParseError, ParseResult, Plugin,
        TypeTag, coerce, encode, encoded, equals, io, optional, register_plugin,
    };

    use super::{ParamsArgs, copy_with, create_params, params_factory, temporary_directory};
    use crate::common::ParamsCommon;
    use crate::{PARAMS_ROOT, Params};

    // --- SessionParams: a representative concrete parameter type ---

    static SESSION_SCHEMA: LazyLock<AttributeSchema> = LazyLock::new(|| {
        ParamsCommon::schema_builder()
            .serializable(&["rate", "epochs"])
            .build()
    });

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct SessionParams {
        #[serde(flatten)]
        common: ParamsCommon,
        rate: Option<f64>,
        epochs: Option<u32>,
    }

    impl Parsable for SessionParams {
        fn schema(&self) -> &'static AttributeSchema {
            &SESSION_SCHEMA
        }

        fn type_tag(&self) -> TypeTag {
            TypeTag::of(Self::TYPE_NAME, Self::MODULE_PATH)
        }

        fn has_attribute(&self, name: &str) -> Option<bool> {
            if let Some(shared) = self.common.has_attribute(name) {
                return Some(shared);
            }
            match name {
                "rate" => Some(self.rate.is_some()),
                "epochs" => Some(self.epochs.is_some()),
                _ => None,
            }
        }

        fn encode_attribute(&self, name: &str) -> ParseResult<Value> {
            if let Some(handled) = self.common.encode_attribute(name) {
                return handled;
            }
            match name {
                "rate" => encoded(&self.rate),
                "epochs" => encoded(&self.epochs),
                _ => Err(ParamsCommon::reject_unknown(name).raised()),
            }
        }

        fn set_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()> {
            if let Some(handled) = self.common.set_attribute(name, value) {
                return handled;
            }
            match name {
                "rate" => self.rate = coerce(name, value)?,
                "epochs" => self.epochs = coerce(name, value)?,
                _ => return Err(ParamsCommon::reject_unknown(name).raised()),
            }
            Ok(())
        }
    }

    impl FromArgs for SessionParams {
        fn from_args(args: &EncodedMap) -> ParseResult<Self> {
            Ok(Self {
                common: ParamsCommon::from_args(args)?,
                rate: optional(args, "rate")?,
                epochs: optional(args, "epochs")?,
            })
        }
    }

    impl Plugin for SessionParams {
        const TYPE_NAME: &'static str = "SessionParams";
        const MODULE_PATH: &'static str = "sessions";
    }

    impl Params for SessionParams {}

    register_plugin!(PARAMS_ROOT, SessionParams);

    fn session(rate: f64) -> SessionParams {
        let mut params = SessionParams {
            rate: Some(rate),
            epochs: Some(10),
            ..SessionParams::default()
        };
        params.common.set_version("1");
        params
    }

    #[test]
    fn create_by_constructor_arguments() {
        let built = create_params(
            "SessionParams",
            ParamsArgs::Json(r#"{"version": "1", "rate": 0.1}"#),
            false,
        )
        .unwrap();
        let params = built.downcast_ref::<SessionParams>().unwrap();
        assert_eq!(params.rate, Some(0.1));
        assert_eq!(params.common.version(), Some("1"));
        assert_eq!(params.epochs, None);
    }

    #[test]
    fn create_by_parsing_an_encoded_map() {
        let wire = encode(&session(0.5)).unwrap();
        let built = create_params("SessionParams", ParamsArgs::Map(&wire), true).unwrap();
        assert!(equals(&session(0.5), built.as_ref()));
    }

    #[test]
    fn create_rejects_non_object_arguments() {
        let err = create_params("SessionParams", ParamsArgs::Json("[1, 2]"), false).unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { .. }));
    }

    #[test]
    fn factory_parses_the_generic_tag() {
        let raw = json!({
            "parsable_type": "SessionParams",
            "parsable_module": "sessions",
            "rate": 0.25,
        })
        .as_object()
        .cloned()
        .unwrap();
        let built = params_factory().parse(&raw).unwrap();
        assert_eq!(built.downcast_ref::<SessionParams>().unwrap().rate, Some(0.25));
    }

    #[test]
    fn copy_with_only_if_missing() {
        let base = session(0.5);
        let overrides = json!({"rate": 0.9, "epochs": 20})
            .as_object()
            .cloned()
            .unwrap();

        let filled = copy_with(&base, true, &overrides).unwrap();
        assert_eq!(filled.rate, Some(0.5));

        let overwritten = copy_with(&base, false, &overrides).unwrap();
        assert_eq!(overwritten.rate, Some(0.9));
        assert_eq!(overwritten.epochs, Some(20));
        // The source is untouched either way.
        assert_eq!(base.rate, Some(0.5));
    }

    #[test]
    fn save_and_load_round_trip() {
        let params = session(0.75);
        let target = format!("{}/params", temporary_directory("og_params_tests"));

        let written = io::save_to_json(&params, &target).unwrap();
        assert_eq!(written.extension().and_then(|ext| ext.to_str()), Some("json"));

        let mut reloaded = SessionParams::default();
        io::load_from_json(&mut reloaded, &written).unwrap();
        assert!(equals(&params, &reloaded));

        std::fs::remove_file(&written).ok();
    }

    #[test]
    fn load_from_missing_file_fails() {
        let mut params = SessionParams::default();
        let err = io::load_from_json(&mut params, "/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ParseError::FileNotFound { .. }));
    }

    #[test]
    fn pickled_round_trip_restores_undeclared_state() {
        let params = session(0.3);
        let dump = io::to_pickled_json(&params).unwrap();
        let restored: SessionParams = super::create_params_pickled(&dump).unwrap();
        assert_eq!(restored.rate, params.rate);
    }

    #[test]
    fn temporary_directory_shape() {
        let path = temporary_directory("og_params");
        assert!(path.contains("og_params"));
        assert!(!path.ends_with('/'));
    }
}
