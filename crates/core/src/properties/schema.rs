use serde::de::DeserializeOwned;
use serde::Serialize;

/// Layout of a typed property record
///
/// The schema carries the record's binding prefix and the fields that hold
/// other records. Scalar fields need no description: serde handles them.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    prefix: &'static str,
    nested: Vec<NestedField>,
}

/// A record field whose value is itself a [`PropertyRecord`]
#[derive(Debug, Clone)]
pub struct NestedField {
    /// Serialized field name
    pub field: &'static str,
    schema: fn() -> PropertySchema,
}

impl NestedField {
    pub fn schema(&self) -> PropertySchema {
        (self.schema)()
    }
}

impl PropertySchema {
    /// Create a schema bound to `prefix` (empty for the store root)
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            nested: Vec::new(),
        }
    }

    /// Declare that `field` holds a `T` record
    pub fn nested<T: PropertyRecord>(mut self, field: &'static str) -> Self {
        self.nested.push(NestedField {
            field,
            schema: T::schema,
        });
        self
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn nested_fields(&self) -> &[NestedField] {
        &self.nested
    }

    pub fn nested_field(&self, field: &str) -> Option<&NestedField> {
        self.nested.iter().find(|nested| nested.field == field)
    }
}

/// A configuration record bound to a key prefix
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize, PropertyRecord)]
/// #[serde(default, rename_all = "camelCase")]
/// #[property(prefix = "server")]
/// struct ServerProperties {
///     port: u16,
///     #[property(nested)]
///     tls: TlsProperties,
/// }
/// ```
pub trait PropertyRecord: Serialize + DeserializeOwned + Default {
    fn schema() -> PropertySchema;

    /// Canonical binding prefix
    fn prefix() -> &'static str {
        Self::schema().prefix()
    }
}
