use crate::value::Value;

/// A field validator. Returns `false` to reject the resolved value.
pub type Validator = fn(&Value) -> bool;

/// The structural kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar (string, number, bool) or free-form value.
    Primitive,
    /// String restricted to the listed options. `null` is always accepted.
    Enum(&'static [&'static str]),
    /// Ordered list. With an item spec, object elements are normalized.
    Array,
    /// Nested document. With an item spec, it is normalized.
    Object,
    /// Binary payload; the backup codec encodes it as a text envelope.
    Blob,
}

/// How a missing field is filled.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// The field must be present in the input.
    Required,
    /// A fixed value, cloned into every record.
    Literal(Value),
    /// Computed once per normalization call (never cached).
    Factory(fn() -> Value),
}

/// Declarative specification of one field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: DefaultValue,
    pub validator: Option<Validator>,
    /// Schema for array elements / nested object fields.
    pub item_spec: Option<Schema>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind, default: DefaultValue) -> Self {
        Self {
            name,
            kind,
            default,
            validator: None,
            item_spec: None,
        }
    }

    /// A field that must be supplied by the caller.
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, DefaultValue::Required)
    }

    /// A field with a literal default.
    pub fn with_default(name: &'static str, kind: FieldKind, default: impl Into<Value>) -> Self {
        Self::new(name, kind, DefaultValue::Literal(default.into()))
    }

    /// A field whose default is computed at normalization time.
    pub fn with_factory(name: &'static str, kind: FieldKind, factory: fn() -> Value) -> Self {
        Self::new(name, kind, DefaultValue::Factory(factory))
    }

    /// Shorthand for a primitive field defaulting to `null`.
    pub fn nullable(name: &'static str) -> Self {
        Self::with_default(name, FieldKind::Primitive, Value::Null)
    }

    /// Shorthand for a string field with a literal default.
    pub fn text(name: &'static str, default: &str) -> Self {
        Self::with_default(name, FieldKind::Primitive, default)
    }

    /// Shorthand for a boolean flag.
    pub fn flag(name: &'static str, default: bool) -> Self {
        Self::with_default(name, FieldKind::Primitive, default)
            .validated(crate::validators::is_bool)
    }

    /// Shorthand for an enum field with a default option.
    pub fn enumeration(
        name: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self::with_default(name, FieldKind::Enum(options), default)
    }

    /// Shorthand for an array field defaulting to `[]`.
    pub fn list(name: &'static str) -> Self {
        Self::with_default(name, FieldKind::Array, Value::Array(Vec::new()))
    }

    /// Shorthand for a binary field defaulting to `null`.
    pub fn blob(name: &'static str) -> Self {
        Self::with_default(name, FieldKind::Blob, Value::Null)
    }

    /// Shorthand for a millisecond timestamp stamped at write time.
    pub fn timestamp(name: &'static str) -> Self {
        Self::with_factory(name, FieldKind::Primitive, || {
            Value::Int(exambank_types::Timestamp::now().as_millis())
        })
    }

    /// Attaches a validator.
    #[must_use]
    pub fn validated(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attaches an item schema (array elements or nested object).
    #[must_use]
    pub fn items(mut self, schema: Schema) -> Self {
        self.item_spec = Some(schema);
        self
    }

    /// Returns true if this field must be supplied.
    pub fn is_required(&self) -> bool {
        matches!(self.default, DefaultValue::Required)
    }
}

/// Ordered list of field specifications.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if any field, at any depth, is a blob.
    pub fn has_blobs(&self) -> bool {
        self.fields.iter().any(|f| {
            f.kind == FieldKind::Blob || f.item_spec.as_ref().is_some_and(Schema::has_blobs)
        })
    }
}
