use std::path::PathBuf;

use core::panic::Location;

// -----------------------------------------------------------------------------
// ParseError

/// A convenience alias for results produced by this crate.
pub type ParseResult<T> = Result<T, ParseError>;

/// The failure taxonomy of the serialization and plugin-resolution engine.
///
/// Every failure surfaces immediately as one of these variants; there is no
/// silent recovery inside the engine. Collaborator I/O failures pass through
/// unchanged via [`ParseError::Io`] and [`ParseError::Json`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A setter rejected the shape of the provided value.
    #[error("attribute `{attribute}` does not accept the provided value: {detail}")]
    TypeMismatch { attribute: String, detail: String },

    /// A name is not registered in any of the six parsing categories.
    ///
    /// This is a contract violation of the type declaring the attribute,
    /// never a data error.
    #[error("the attribute `{attribute}` is not registered in any parsing category")]
    UnknownAttribute { attribute: String },

    /// The supplied construction arguments do not cover the required fields.
    #[error("required fields {missing:?} are not provided{}", fmt_target(.type_name))]
    MissingRequiredArguments {
        type_name: String,
        missing: Vec<String>,
    },

    /// A type name could not be resolved to a registered concrete type.
    #[error("plugin `{type_name}` is not registered{}", fmt_module(.module_path.as_deref()))]
    UnresolvedPlugin {
        type_name: String,
        module_path: Option<String>,
    },

    /// A descriptor does not carry the declared type/module field names.
    #[error("unable to extract plugin descriptor field `{key}`: {detail}")]
    MissingPluginDescriptor { key: String, detail: String },

    /// A specialized attribute has no `{encode,decode}` codec on its type.
    #[error("attribute `{attribute}` has no specialized {operation} codec")]
    MissingCodec {
        attribute: String,
        operation: &'static str,
    },

    /// A symbolic name or ordinal index is outside the enum domain.
    #[error("`{value}` is not in the domain of enum attribute `{attribute}`")]
    EnumDomainError { attribute: String, value: String },

    /// The explicit parsing order references unregistered attribute names.
    #[error("the ordered attributes {missing:?} are missing from the registered attributes")]
    OrderingError { missing: Vec<String> },

    /// The resolved plugin was registered for construction only.
    #[error("plugin `{type_name}` does not support hydration from an encoded map")]
    UnsupportedHydration { type_name: String },

    /// A load path does not point to an existing file.
    #[error("the file path `{path}` does not exist, cannot load object")]
    FileNotFound { path: PathBuf },

    /// Collaborator filesystem failure, propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Collaborator JSON codec failure, propagated unchanged.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn fmt_target(type_name: &str) -> String {
    if type_name.is_empty() {
        String::new()
    } else {
        format!(" when constructing `{type_name}`")
    }
}

fn fmt_module(module_path: Option<&str>) -> String {
    match module_path {
        Some(path) => format!(" and module `{path}` did not provide it"),
        None => String::from(" and no module path is known"),
    }
}

impl ParseError {
    /// Record this failure on the error stream together with the call site
    /// that raised it, then hand the error back for propagation.
    ///
    /// Callers decide afterwards whether to propagate or (for best-effort
    /// resolution paths) swallow the failure; the log record is emitted either
    /// way.
    #[track_caller]
    #[must_use]
    pub fn raised(self) -> Self {
        let location = Location::caller();
        tracing::error!(target: "og_parsable", %location, error = %self, "parse failure raised");
        self
    }
}
