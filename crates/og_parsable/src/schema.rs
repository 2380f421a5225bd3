use og_utils::hash::HashMap;

use crate::errors::{ParseError, ParseResult};

// -----------------------------------------------------------------------------
// Category

/// The six mutually exclusive attribute kinds governing encode/decode
/// handling.
///
/// Categories are walked in this declaration order by the encode, decode,
/// update and equality drivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Plain JSON-compatible values, emitted as-is (array-like values are
    /// flattened to plain sequences).
    Serializable,
    /// Enum values, emitted as their symbolic name.
    Enum,
    /// A single nested parsable object, encoded recursively.
    Nested,
    /// A map of nested parsable objects, keys preserved.
    NestedMap,
    /// A sequence of nested parsable objects, order preserved.
    NestedSeq,
    /// Attributes with a type-provided encode/decode codec pair.
    Specialized,
}

impl Category {
    /// All categories in the fixed walking order.
    pub const ALL: [Category; 6] = [
        Category::Serializable,
        Category::Enum,
        Category::Nested,
        Category::NestedMap,
        Category::NestedSeq,
        Category::Specialized,
    ];
}

// -----------------------------------------------------------------------------
// AttributeSchema

/// Per-type classification of attribute names into the six [`Category`]s,
/// plus the explicit parsing-order prefix.
///
/// Membership is fixed at type-definition time: a concrete type builds its
/// schema once (usually in a `LazyLock` static) and hands out the same
/// reference from `Parsable::schema`. Category membership is cumulative
/// across composition, see [`AttributeSchemaBuilder::extend`].
///
/// # Examples
///
/// ```
/// use og_parsable::{AttributeSchema, Category};
///
/// let schema = AttributeSchema::builder()
///     .serializable(&["version", "rate"])
///     .enums(&["mode"])
///     .order(&["mode"])
///     .build();
///
/// assert_eq!(schema.category_of("rate"), Some(Category::Serializable));
/// assert_eq!(schema.category_of("mode"), Some(Category::Enum));
/// assert_eq!(schema.category_of("unknown"), None);
///
/// let (ordered, unordered) = schema.split_ordered().unwrap();
/// assert_eq!(ordered, ["mode"]);
/// assert_eq!(unordered, ["version", "rate"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct AttributeSchema {
    serializable: Vec<&'static str>,
    enums: Vec<&'static str>,
    nested: Vec<&'static str>,
    nested_maps: Vec<&'static str>,
    nested_seqs: Vec<&'static str>,
    specialized: Vec<&'static str>,
    order: Vec<&'static str>,
    index: HashMap<&'static str, Category>,
}

impl AttributeSchema {
    /// Start declaring a schema.
    #[inline]
    pub fn builder() -> AttributeSchemaBuilder {
        AttributeSchemaBuilder {
            schema: og_utils::default(),
        }
    }

    /// Names registered in `category`, in declaration order.
    pub fn names(&self, category: Category) -> &[&'static str] {
        match category {
            Category::Serializable => &self.serializable,
            Category::Enum => &self.enums,
            Category::Nested => &self.nested,
            Category::NestedMap => &self.nested_maps,
            Category::NestedSeq => &self.nested_seqs,
            Category::Specialized => &self.specialized,
        }
    }

    /// All registered names, walking the categories in their fixed order.
    pub fn all_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(|category| self.names(category).iter().copied())
    }

    /// The category `name` is registered under, or `None` for an unknown
    /// name.
    #[inline]
    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.index.get(name).copied()
    }

    /// Whether `name` is registered in any category.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Total number of registered attribute names.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// The declared explicit parsing order (possibly empty).
    #[inline]
    pub fn declared_order(&self) -> &[&'static str] {
        &self.order
    }

    /// Split the registered names into the explicit-priority prefix and the
    /// remainder.
    ///
    /// `ordered` preserves the declared sequence; `unordered` holds the rest
    /// in category-declaration order. Some setters have cross-field
    /// dependencies (a discriminator must land before a payload whose
    /// validity depends on it); the split makes hydration deterministic with
    /// respect to such dependencies.
    ///
    /// # Errors
    ///
    /// [`ParseError::OrderingError`] naming every declared-order entry that
    /// is not a registered attribute.
    pub fn split_ordered(&self) -> ParseResult<(Vec<&'static str>, Vec<&'static str>)> {
        if self.order.is_empty() {
            return Ok((Vec::new(), self.all_names().collect()));
        }

        let missing: Vec<String> = self
            .order
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .map(str::to_owned)
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::OrderingError { missing }.raised());
        }

        let unordered = self
            .all_names()
            .filter(|name| !self.order.contains(name))
            .collect();
        Ok((self.order.clone(), unordered))
    }
}

// -----------------------------------------------------------------------------
// AttributeSchemaBuilder

/// Builder for [`AttributeSchema`].
///
/// Registering the same name twice (in any category) is a contract violation
/// of the declaring type and panics; every registered name must belong to
/// exactly one category.
pub struct AttributeSchemaBuilder {
    schema: AttributeSchema,
}

impl AttributeSchemaBuilder {
    fn register(&mut self, category: Category, names: &[&'static str]) {
        for &name in names {
            if let Some(previous) = self.schema.index.insert(name, category) {
                panic!("attribute `{name}` is already registered as {previous:?}");
            }
        }
        let list = match category {
            Category::Serializable => &mut self.schema.serializable,
            Category::Enum => &mut self.schema.enums,
            Category::Nested => &mut self.schema.nested,
            Category::NestedMap => &mut self.schema.nested_maps,
            Category::NestedSeq => &mut self.schema.nested_seqs,
            Category::Specialized => &mut self.schema.specialized,
        };
        list.extend_from_slice(names);
    }

    /// Register plain serializable attribute names.
    #[must_use]
    pub fn serializable(mut self, names: &[&'static str]) -> Self {
        self.register(Category::Serializable, names);
        self
    }

    /// Register enum attribute names.
    #[must_use]
    pub fn enums(mut self, names: &[&'static str]) -> Self {
        self.register(Category::Enum, names);
        self
    }

    /// Register nested-object attribute names.
    #[must_use]
    pub fn nested(mut self, names: &[&'static str]) -> Self {
        self.register(Category::Nested, names);
        self
    }

    /// Register map-of-nested-object attribute names.
    #[must_use]
    pub fn nested_maps(mut self, names: &[&'static str]) -> Self {
        self.register(Category::NestedMap, names);
        self
    }

    /// Register sequence-of-nested-object attribute names.
    #[must_use]
    pub fn nested_seqs(mut self, names: &[&'static str]) -> Self {
        self.register(Category::NestedSeq, names);
        self
    }

    /// Register specialized attribute names (the type must provide the
    /// matching encode/decode codec pair).
    #[must_use]
    pub fn specialized(mut self, names: &[&'static str]) -> Self {
        self.register(Category::Specialized, names);
        self
    }

    /// Append names to the explicit parsing order.
    #[must_use]
    pub fn order(mut self, names: &[&'static str]) -> Self {
        self.schema.order.extend_from_slice(names);
        self
    }

    /// Pull in every declaration of `base`, making category membership
    /// cumulative across an embedding type's ancestry.
    #[must_use]
    pub fn extend(mut self, base: &AttributeSchema) -> Self {
        for category in Category::ALL {
            self.register(category, base.names(category));
        }
        self.schema.order.extend_from_slice(&base.order);
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> AttributeSchema {
        self.schema
    }
}
