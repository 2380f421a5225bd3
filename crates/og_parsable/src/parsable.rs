use core::any::Any;

use serde_json::Value;

use crate::encoded::{EncodedMap, TypeTag};
use crate::errors::{ParseError, ParseResult};
use crate::schema::{AttributeSchema, Category};

// -----------------------------------------------------------------------------
// Parsable

/// The capability implemented by every type participating in the engine.
///
/// A `Parsable` type declares its attribute taxonomy once (an
/// [`AttributeSchema`] static) and exposes uniform, name-addressed access to
/// its attributes. The free drivers [`encode`], [`decode`], [`update`] and
/// [`equals`] walk the schema and perform the actual serialization work, so
/// implementations only supply per-attribute dispatch.
///
/// Setters are the single coercion point: [`set_attribute`] receives raw
/// JSON values and is expected to validate shape, resolve enum symbols and
/// route still-encoded tagged maps through a [`PluginFactory`] before
/// storing ("parse on assignment"). The helpers in the crate root
/// ([`coerce`], [`enum_from_value`], [`assign_parsable`],
/// [`collect_map_of`], [`collect_seq_of`]) cover the usual cases.
///
/// [`PluginFactory`]: crate::PluginFactory
/// [`coerce`]: crate::coerce
/// [`enum_from_value`]: crate::enum_from_value
/// [`assign_parsable`]: crate::assign_parsable
/// [`collect_map_of`]: crate::collect_map_of
/// [`collect_seq_of`]: crate::collect_seq_of
/// [`set_attribute`]: Parsable::set_attribute
pub trait Parsable: Any {
    /// The attribute taxonomy of this concrete type.
    fn schema(&self) -> &'static AttributeSchema;

    /// The identity embedded into every encoded map.
    fn type_tag(&self) -> TypeTag;

    /// Tri-state presence query.
    ///
    /// `Some(true)` / `Some(false)` for optional attributes that are
    /// currently set / unset; `None` when the attribute carries no presence
    /// query (it always holds a value and is always emitted).
    fn has_attribute(&self, name: &str) -> Option<bool>;

    /// The encoded (JSON-compatible) form of a serializable or enum
    /// attribute. Enum attributes encode as their symbolic name.
    ///
    /// Only called by the drivers when the attribute reports present.
    fn encode_attribute(&self, name: &str) -> ParseResult<Value>;

    /// Assign a raw value through this attribute's setter, coercing and
    /// validating on the way in.
    fn set_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()>;

    /// Assignment hook used by [`update`]; defaults to the plain setter.
    ///
    /// Override per attribute when a selective update should merge rather
    /// than replace.
    fn update_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()> {
        self.set_attribute(name, value)
    }

    /// Borrow a nested-object attribute for recursive encode/equals.
    fn nested_attribute(&self, name: &str) -> ParseResult<&dyn Parsable> {
        Err(ParseError::UnknownAttribute {
            attribute: name.to_owned(),
        }
        .raised())
    }

    /// Borrow the entries of a map-of-nested-object attribute, keys
    /// preserved.
    fn nested_entries(&self, name: &str) -> ParseResult<Vec<(&str, &dyn Parsable)>> {
        Err(ParseError::UnknownAttribute {
            attribute: name.to_owned(),
        }
        .raised())
    }

    /// Borrow the elements of a sequence-of-nested-object attribute, order
    /// preserved.
    fn nested_items(&self, name: &str) -> ParseResult<Vec<&dyn Parsable>> {
        Err(ParseError::UnknownAttribute {
            attribute: name.to_owned(),
        }
        .raised())
    }

    /// Type-provided codec for a specialized attribute.
    fn specialized_encode(&self, name: &str) -> ParseResult<Value> {
        Err(ParseError::MissingCodec {
            attribute: name.to_owned(),
            operation: "encode",
        }
        .raised())
    }

    /// Type-provided codec for a specialized attribute.
    fn specialized_decode(&mut self, name: &str, value: &Value) -> ParseResult<()> {
        let _ = value;
        Err(ParseError::MissingCodec {
            attribute: name.to_owned(),
            operation: "decode",
        }
        .raised())
    }
}

impl dyn Parsable {
    /// Whether the underlying concrete type is `T`.
    #[inline]
    pub fn is<T: Parsable>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<T>()
    }

    /// Downcast to a concrete reference.
    #[inline]
    pub fn downcast_ref<T: Parsable>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }

    /// Downcast to a concrete mutable reference.
    #[inline]
    pub fn downcast_mut<T: Parsable>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self;
        any.downcast_mut::<T>()
    }
}

impl core::fmt::Debug for dyn Parsable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("dyn Parsable")
            .field("type_tag", &self.type_tag())
            .finish()
    }
}

/// Take the concrete value out of a boxed [`Parsable`], handing the box back
/// on a type mismatch.
pub fn take<T: Parsable>(boxed: Box<dyn Parsable>) -> Result<T, Box<dyn Parsable>> {
    if boxed.is::<T>() {
        let any: Box<dyn Any> = boxed;
        // Checked above.
        Ok(*any.downcast::<T>().unwrap_or_else(|_| unreachable!()))
    } else {
        Err(boxed)
    }
}

// -----------------------------------------------------------------------------
// Construction from named values

/// Construction from a map of named initial values.
///
/// This is the explicit constructor surface the plugin registry records for
/// every concrete type; [`required`](crate::required) and
/// [`optional`](crate::optional) cover the usual field extraction.
pub trait FromArgs: Sized {
    fn from_args(args: &EncodedMap) -> ParseResult<Self>;
}

// -----------------------------------------------------------------------------
// Encode driver

/// Whether the attribute should be emitted: no presence query means always,
/// otherwise the query decides.
#[inline]
fn present(object: &dyn Parsable, name: &str) -> bool {
    object.has_attribute(name).unwrap_or(true)
}

/// Encode `object` into a tagged map.
///
/// Emits the [`TypeTag`] keys first, then each category in the fixed order.
/// Optional attributes that were never set produce no key at all, preserving
/// the never-set/set-empty distinction on the wire. The walk is pure: the
/// object is not mutated.
pub fn encode(object: &dyn Parsable) -> ParseResult<EncodedMap> {
    let mut output = EncodedMap::new();
    object.type_tag().embed(&mut output);
    let schema = object.schema();

    for name in schema.names(Category::Serializable) {
        if present(object, name) {
            output.insert((*name).to_owned(), object.encode_attribute(name)?);
        }
    }
    for name in schema.names(Category::Enum) {
        if present(object, name) {
            output.insert((*name).to_owned(), object.encode_attribute(name)?);
        }
    }
    for name in schema.names(Category::Nested) {
        if present(object, name) {
            let nested = object.nested_attribute(name)?;
            output.insert((*name).to_owned(), Value::Object(encode(nested)?));
        }
    }
    for name in schema.names(Category::NestedMap) {
        if present(object, name) {
            let mut entries = EncodedMap::new();
            for (key, nested) in object.nested_entries(name)? {
                entries.insert(key.to_owned(), Value::Object(encode(nested)?));
            }
            output.insert((*name).to_owned(), Value::Object(entries));
        }
    }
    for name in schema.names(Category::NestedSeq) {
        if present(object, name) {
            let mut items = Vec::new();
            for nested in object.nested_items(name)? {
                items.push(Value::Object(encode(nested)?));
            }
            output.insert((*name).to_owned(), Value::Array(items));
        }
    }
    for name in schema.names(Category::Specialized) {
        if present(object, name) {
            output.insert((*name).to_owned(), object.specialized_encode(name)?);
        }
    }

    Ok(output)
}

// -----------------------------------------------------------------------------
// Decode / update drivers

/// Hydrate `object` from an encoded map.
///
/// Attribute names are walked in the `(ordered, unordered)` split of the
/// schema so that setters with cross-field dependencies observe a
/// deterministic assignment sequence. Keys absent from `raw` are skipped;
/// assignment goes through the setters, which coerce, validate and
/// parse-on-assign.
pub fn decode(object: &mut dyn Parsable, raw: &EncodedMap) -> ParseResult<()> {
    let schema = object.schema();
    let (ordered, unordered) = schema.split_ordered()?;
    for name in ordered.into_iter().chain(unordered) {
        apply_attribute(object, schema, name, raw, false)?;
    }
    Ok(())
}

/// Selectively hydrate `object` from an encoded map.
///
/// With `only_if_missing`, any attribute whose presence query reports
/// present is skipped entirely, allowing a partial overlay of defaults that
/// never clobbers already-set fields. Assignment goes through
/// [`Parsable::update_attribute`].
pub fn update(object: &mut dyn Parsable, only_if_missing: bool, raw: &EncodedMap) -> ParseResult<()> {
    let schema = object.schema();
    let (ordered, unordered) = schema.split_ordered()?;
    for name in ordered.into_iter().chain(unordered) {
        if only_if_missing && object.has_attribute(name) == Some(true) {
            continue;
        }
        apply_attribute(object, schema, name, raw, true)?;
    }
    Ok(())
}

fn apply_attribute(
    object: &mut dyn Parsable,
    schema: &AttributeSchema,
    name: &'static str,
    raw: &EncodedMap,
    updating: bool,
) -> ParseResult<()> {
    let Some(value) = raw.get(name) else {
        return Ok(());
    };
    match schema.category_of(name) {
        Some(Category::Specialized) => object.specialized_decode(name, value),
        Some(_) if updating => object.update_attribute(name, value),
        Some(_) => object.set_attribute(name, value),
        None => Err(ParseError::UnknownAttribute {
            attribute: name.to_owned(),
        }
        .raised()),
    }
}

// -----------------------------------------------------------------------------
// Equality driver

/// Tri-state-aware structural equality.
///
/// Returns `false` immediately when the runtime types differ (a subtype is
/// never equal to its parent type, even with identical data). Otherwise each
/// category list is scanned in the fixed order: attributes that are absent
/// on both sides compare equal, presence disagreement compares unequal, and
/// present values are compared structurally, recursing into nested values
/// via their own `equals`. Short-circuits on the first inequality.
pub fn equals(left: &dyn Parsable, right: &dyn Parsable) -> bool {
    let left_any: &dyn Any = left;
    let right_any: &dyn Any = right;
    if left_any.type_id() != right_any.type_id() {
        return false;
    }

    let schema = left.schema();
    for category in Category::ALL {
        for name in schema.names(category) {
            match (left.has_attribute(name), right.has_attribute(name)) {
                (Some(false), Some(false)) => continue,
                (Some(lhs), Some(rhs)) if lhs != rhs => return false,
                _ => {}
            }
            if !attribute_equals(left, right, category, name) {
                return false;
            }
        }
    }
    true
}

fn attribute_equals(left: &dyn Parsable, right: &dyn Parsable, category: Category, name: &str) -> bool {
    match category {
        Category::Serializable | Category::Enum => {
            match (left.encode_attribute(name), right.encode_attribute(name)) {
                (Ok(lhs), Ok(rhs)) => lhs == rhs,
                _ => false,
            }
        }
        Category::Specialized => {
            match (left.specialized_encode(name), right.specialized_encode(name)) {
                (Ok(lhs), Ok(rhs)) => lhs == rhs,
                _ => false,
            }
        }
        Category::Nested => match (left.nested_attribute(name), right.nested_attribute(name)) {
            (Ok(lhs), Ok(rhs)) => equals(lhs, rhs),
            _ => false,
        },
        Category::NestedMap => match (left.nested_entries(name), right.nested_entries(name)) {
            (Ok(lhs), Ok(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().all(|(key, lvalue)| {
                        rhs.iter()
                            .find(|(other, _)| other == key)
                            .is_some_and(|(_, rvalue)| equals(*lvalue, *rvalue))
                    })
            }
            _ => false,
        },
        Category::NestedSeq => match (left.nested_items(name), right.nested_items(name)) {
            (Ok(lhs), Ok(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs
                        .iter()
                        .zip(rhs.iter())
                        .all(|(lvalue, rvalue)| equals(*lvalue, *rvalue))
            }
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::LazyLock;

    use serde_json::{Value, json};

    use super::{FromArgs, Parsable, decode, encode, equals, update};
    use crate::encoded::{EncodedMap, TypeTag};
    use crate::errors::{ParseError, ParseResult};
    use crate::plugin::PluginFactory;
    use crate::registry::Plugin;
    use crate::schema::AttributeSchema;
    use crate::{
        ParsableEnum, assign_parsable, coerce, collect_map_of, collect_seq_of, encoded,
        enum_from_value, optional,
    };

    const ROOT: &str = "og_parsable::parsable::tests::Shape";

    fn factory() -> PluginFactory<'static> {
        PluginFactory::new(ROOT)
    }

    // --- Point: the minimal nested type, provided by the "geo" module ---

    static POINT_SCHEMA: LazyLock<AttributeSchema> =
        LazyLock::new(|| AttributeSchema::builder().serializable(&["x", "y"]).build());

    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        x: f64,
        y: f64,
    }

    impl Parsable for Point {
        fn schema(&self) -> &'static AttributeSchema {
            &POINT_SCHEMA
        }

        fn type_tag(&self) -> TypeTag {
            TypeTag::of(Self::TYPE_NAME, Self::MODULE_PATH)
        }

        fn has_attribute(&self, _name: &str) -> Option<bool> {
            None
        }

        fn encode_attribute(&self, name: &str) -> ParseResult<Value> {
            match name {
                "x" => encoded(&self.x),
                "y" => encoded(&self.y),
                _ => Err(ParseError::UnknownAttribute {
                    attribute: name.to_owned(),
                }
                .raised()),
            }
        }

        fn set_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()> {
            match name {
                "x" => self.x = coerce(name, value)?,
                "y" => self.y = coerce(name, value)?,
                _ => {
                    return Err(ParseError::UnknownAttribute {
                        attribute: name.to_owned(),
                    }
                    .raised());
                }
            }
            Ok(())
        }
    }

    impl FromArgs for Point {
        fn from_args(args: &EncodedMap) -> ParseResult<Self> {
            Ok(Self {
                x: crate::required(args, "x")?,
                y: crate::required(args, "y")?,
            })
        }
    }

    impl Plugin for Point {
        const TYPE_NAME: &'static str = "Point";
        const MODULE_PATH: &'static str = "geo";
        const REQUIRED_FIELDS: &'static [&'static str] = &["x", "y"];
    }

    // Point is deliberately not self-registered under ROOT; resolution goes
    // through the module-load fallback the first time and is cached after.
    crate::register_module!("geo", [Point]);

    // --- Phase: the enum attribute domain ---

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Phase {
        Warmup,
        Steady,
    }

    impl ParsableEnum for Phase {
        const DOMAIN: &'static [(&'static str, Self)] =
            &[("Warmup", Phase::Warmup), ("Steady", Phase::Steady)];
    }

    // --- Profile: one attribute in every category ---

    static PROFILE_SCHEMA: LazyLock<AttributeSchema> = LazyLock::new(|| {
        AttributeSchema::builder()
            .serializable(&["label", "tags"])
            .enums(&["phase"])
            .nested(&["origin"])
            .nested_maps(&["anchors"])
            .nested_seqs(&["route"])
            .specialized(&["mask"])
            .order(&["phase"])
            .build()
    });

    #[derive(Clone, Debug, Default)]
    struct Profile {
        label: Option<String>,
        tags: Vec<String>,
        phase: Option<Phase>,
        origin: Option<Point>,
        anchors: Option<BTreeMap<String, Point>>,
        route: Option<Vec<Point>>,
        mask: Option<u64>,
    }

    impl Parsable for Profile {
        fn schema(&self) -> &'static AttributeSchema {
            &PROFILE_SCHEMA
        }

        fn type_tag(&self) -> TypeTag {
            TypeTag::of(Self::TYPE_NAME, Self::MODULE_PATH)
        }

        fn has_attribute(&self, name: &str) -> Option<bool> {
            match name {
                "label" => Some(self.label.is_some()),
                "phase" => Some(self.phase.is_some()),
                "origin" => Some(self.origin.is_some()),
                "anchors" => Some(self.anchors.is_some()),
                "route" => Some(self.route.is_some()),
                "mask" => Some(self.mask.is_some()),
                _ => None,
            }
        }

        fn encode_attribute(&self, name: &str) -> ParseResult<Value> {
            match name {
                "label" => encoded(&self.label),
                "tags" => encoded(&self.tags),
                "phase" => match &self.phase {
                    Some(phase) => Ok(Value::String(phase.symbol().to_owned())),
                    None => Ok(Value::Null),
                },
                _ => Err(ParseError::UnknownAttribute {
                    attribute: name.to_owned(),
                }
                .raised()),
            }
        }

        fn set_attribute(&mut self, name: &str, value: &Value) -> ParseResult<()> {
            match name {
                "label" => self.label = coerce(name, value)?,
                "tags" => self.tags = coerce(name, value)?,
                "phase" => self.phase = Some(enum_from_value(name, value)?),
                "origin" => self.origin = Some(assign_parsable(&factory(), name, value)?),
                "anchors" => self.anchors = Some(collect_map_of(&factory(), name, value)?),
                "route" => self.route = Some(collect_seq_of(&factory(), name, value)?),
                _ => {
                    return Err(ParseError::UnknownAttribute {
                        attribute: name.to_owned(),
                    }
                    .raised());
                }
            }
            Ok(())
        }

        fn nested_attribute(&self, name: &str) -> ParseResult<&dyn Parsable> {
            match (name, &self.origin) {
                ("origin", Some(origin)) => Ok(origin),
                _ => Err(ParseError::UnknownAttribute {
                    attribute: name.to_owned(),
                }
                .raised()),
            }
        }

        fn nested_entries(&self, name: &str) -> ParseResult<Vec<(&str, &dyn Parsable)>> {
            match (name, &self.anchors) {
                ("anchors", Some(anchors)) => Ok(anchors
                    .iter()
                    .map(|(key, point)| (key.as_str(), point as &dyn Parsable))
                    .collect()),
                _ => Err(ParseError::UnknownAttribute {
                    attribute: name.to_owned(),
                }
                .raised()),
            }
        }

        fn nested_items(&self, name: &str) -> ParseResult<Vec<&dyn Parsable>> {
            match (name, &self.route) {
                ("route", Some(route)) => {
                    Ok(route.iter().map(|point| point as &dyn Parsable).collect())
                }
                _ => Err(ParseError::UnknownAttribute {
                    attribute: name.to_owned(),
                }
                .raised()),
            }
        }

        fn specialized_encode(&self, name: &str) -> ParseResult<Value> {
            match (name, &self.mask) {
                ("mask", Some(mask)) => Ok(Value::String(format!("{mask:#018x}"))),
                _ => Err(ParseError::MissingCodec {
                    attribute: name.to_owned(),
                    operation: "encode",
                }
                .raised()),
            }
        }

        fn specialized_decode(&mut self, name: &str, value: &Value) -> ParseResult<()> {
            if name != "mask" {
                return Err(ParseError::MissingCodec {
                    attribute: name.to_owned(),
                    operation: "decode",
                }
                .raised());
            }
            let text: String = coerce(name, value)?;
            let digits = text.trim_start_matches("0x");
            self.mask = Some(u64::from_str_radix(digits, 16).map_err(|err| {
                ParseError::TypeMismatch {
                    attribute: name.to_owned(),
                    detail: err.to_string(),
                }
                .raised()
            })?);
            Ok(())
        }
    }

    impl FromArgs for Profile {
        fn from_args(args: &EncodedMap) -> ParseResult<Self> {
            Ok(Self {
                label: optional(args, "label")?,
                tags: optional(args, "tags")?.unwrap_or_default(),
                ..Self::default()
            })
        }
    }

    impl Plugin for Profile {
        const TYPE_NAME: &'static str = "Profile";
        const MODULE_PATH: &'static str = "profiles";
    }

    crate::register_plugin!(ROOT, Profile);

    fn full_profile() -> Profile {
        Profile {
            label: Some("baseline".to_owned()),
            tags: vec!["a".to_owned(), "b".to_owned()],
            phase: Some(Phase::Steady),
            origin: Some(Point { x: 1.0, y: 2.0 }),
            anchors: Some(BTreeMap::from([
                ("start".to_owned(), Point { x: 0.0, y: 0.0 }),
                ("end".to_owned(), Point { x: 4.0, y: 4.0 }),
            ])),
            route: Some(vec![Point { x: 0.0, y: 0.0 }, Point { x: 2.0, y: 2.0 }]),
            mask: Some(0x00ff),
        }
    }

    #[test]
    fn round_trip_covers_all_categories() {
        let original = full_profile();
        let wire = encode(&original).unwrap();

        let hydrated = factory().parse(&wire).unwrap();
        assert!(equals(&original, hydrated.as_ref()));

        let profile = hydrated.downcast_ref::<Profile>().unwrap();
        assert_eq!(profile.origin, Some(Point { x: 1.0, y: 2.0 }));
        assert_eq!(profile.mask, Some(0x00ff));
    }

    #[test]
    fn encode_is_idempotent() {
        let wire = encode(&full_profile()).unwrap();
        let mut decoded = Profile::default();
        decode(&mut decoded, &wire).unwrap();
        let rewire = encode(&decoded).unwrap();
        assert_eq!(wire, rewire);
    }

    #[test]
    fn encode_embeds_the_type_tag() {
        let wire = encode(&full_profile()).unwrap();
        assert_eq!(wire.get("parsable_type"), Some(&json!("Profile")));
        assert_eq!(wire.get("parsable_module"), Some(&json!("profiles")));
    }

    #[test]
    fn presence_aware_omission() {
        let sparse = Profile {
            tags: vec!["only".to_owned()],
            ..Profile::default()
        };
        let wire = encode(&sparse).unwrap();
        assert!(!wire.contains_key("label"));
        assert!(!wire.contains_key("origin"));
        assert!(!wire.contains_key("mask"));
        assert!(wire.contains_key("tags"));

        let mut decoded = Profile::default();
        decode(&mut decoded, &wire).unwrap();
        assert_eq!(decoded.has_attribute("label"), Some(false));
        assert_eq!(decoded.tags, ["only"]);
    }

    #[test]
    fn update_only_if_missing_policy() {
        let mut profile = Profile {
            label: Some("keep".to_owned()),
            ..Profile::default()
        };
        let overlay = json!({"label": "overwrite", "mask": "0xff"})
            .as_object()
            .cloned()
            .unwrap();

        update(&mut profile, true, &overlay).unwrap();
        assert_eq!(profile.label.as_deref(), Some("keep"));
        // `mask` was missing, so the overlay fills it in.
        assert_eq!(profile.mask, Some(0xff));

        update(&mut profile, false, &overlay).unwrap();
        assert_eq!(profile.label.as_deref(), Some("overwrite"));
    }

    #[test]
    fn equality_is_tri_state() {
        let unset_a = Profile::default();
        let unset_b = Profile::default();
        assert!(equals(&unset_a, &unset_b));

        let set = Profile {
            label: Some("x".to_owned()),
            ..Profile::default()
        };
        assert!(!equals(&unset_a, &set));
        assert!(!equals(&set, &unset_a));
    }

    #[test]
    fn equality_recurses_into_nested_values() {
        let left = full_profile();
        let mut right = full_profile();
        assert!(equals(&left, &right));

        right.route.as_mut().unwrap()[1].y = 3.0;
        assert!(!equals(&left, &right));
    }

    #[test]
    fn different_runtime_types_are_never_equal() {
        let point = Point { x: 1.0, y: 2.0 };
        let profile = Profile::default();
        assert!(!equals(&point, &profile));
    }

    #[test]
    fn point_scenario_from_tagged_map() {
        let wire = json!({
            "parsable_type": "Point",
            "parsable_module": "geo",
            "x": 1.0,
            "y": 2.0,
        })
        .as_object()
        .cloned()
        .unwrap();

        let hydrated = factory().parse(&wire).unwrap();
        let point = hydrated.downcast_ref::<Point>().unwrap();
        assert_eq!(point, &Point { x: 1.0, y: 2.0 });

        let rewire = encode(point).unwrap();
        assert_eq!(rewire, wire);
    }

    #[test]
    fn enum_setter_rejects_out_of_domain_values() {
        let mut profile = Profile::default();
        let raw = json!({"phase": "Sprint"}).as_object().cloned().unwrap();
        let err = decode(&mut profile, &raw).unwrap_err();
        assert!(matches!(err, ParseError::EnumDomainError { .. }));
    }

    #[test]
    fn untyped_downcast_helpers() {
        let boxed: Box<dyn Parsable> = Box::new(Point { x: 0.5, y: 0.5 });
        assert!(boxed.is::<Point>());
        assert!(boxed.downcast_ref::<Profile>().is_none());
        let point: Point = super::take(boxed).map_err(|_| ()).unwrap();
        assert_eq!(point.x, 0.5);
    }

    #[test]
    fn element_wise_hydration_passes_untagged_values_through() {
        use crate::{Hydrated, parse_value, parsed_list, parsed_map};

        let tagged = json!({
            "parsable_type": "Point",
            "parsable_module": "geo",
            "x": 1.0,
            "y": 1.0,
        });

        // Untagged values come back as they went in.
        match parse_value(&factory(), &json!(42), true).unwrap() {
            Hydrated::Raw(value) => assert_eq!(value, json!(42)),
            Hydrated::Parsed(_) => panic!("a plain number must not hydrate"),
        }

        let items = parsed_list(&factory(), &[tagged.clone(), json!("marker")]).unwrap();
        assert!(matches!(items[0], Hydrated::Parsed(_)));
        assert!(matches!(items[1], Hydrated::Raw(_)));

        let map = json!({"a": tagged, "b": {"x": 1}})
            .as_object()
            .cloned()
            .unwrap();
        let entries = parsed_map(&factory(), &map).unwrap();
        let parsed_a = entries
            .iter()
            .find(|(key, _)| key == "a")
            .map(|(_, value)| matches!(value, Hydrated::Parsed(_)))
            .unwrap();
        assert!(parsed_a);
        // "b" is an object without a type tag: untouched.
        let raw_b = entries
            .iter()
            .find(|(key, _)| key == "b")
            .map(|(_, value)| matches!(value, Hydrated::Raw(_)))
            .unwrap();
        assert!(raw_b);
    }

    #[test]
    fn non_strict_resolution_returns_the_input_unchanged() {
        use crate::{Hydrated, parse_value};

        // A tagged map naming an unknown type with no resolvable module.
        let unknown = json!({"parsable_type": "Ghost", "x": 1});
        let err = parse_value(&factory(), &unknown, true).unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedPlugin { .. }));

        match parse_value(&factory(), &unknown, false).unwrap() {
            Hydrated::Raw(value) => assert_eq!(value, unknown),
            Hydrated::Parsed(_) => panic!("an unresolvable tag cannot hydrate"),
        }
    }
}
