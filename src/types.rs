use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Name of the identity field every record carries
pub const ID_FIELD: &str = "id";

/// Record identity - integers in practice, text when a source uses string keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Reads an id out of a JSON value. Only integers and strings qualify.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(RecordId::Int),
            serde_json::Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            RecordId::Int(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<RecordId> for FieldValue {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Int(id) => FieldValue::Integer(id),
            RecordId::Text(text) => FieldValue::Text(text),
        }
    }
}

/// Scalar cell value. Dates travel as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Converts a JSON scalar. Null, arrays and objects have no scalar form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Integer(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// A validated data row: unique id plus named scalar fields in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Sets a field, replacing an existing value in place. The id is not a
    /// regular field and cannot be overwritten this way.
    pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) {
        if key == ID_FIELD {
            return;
        }
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    /// Field lookup; `id` resolves to the record id.
    pub fn get(&self, key: &str) -> Option<Cow<'_, FieldValue>> {
        if key == ID_FIELD {
            return Some(Cow::Owned(self.id.clone().into()));
        }
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Cow::Borrowed(v))
    }

    pub fn has_field(&self, key: &str) -> bool {
        key == ID_FIELD || self.fields.iter().any(|(k, _)| k == key)
    }

    /// Field names in source order, id first
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ID_FIELD).chain(self.fields.iter().map(|(k, _)| k.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Column projection: which field to read and the label shown for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub header: String,
}

impl ColumnDescriptor {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
        }
    }

    /// Typed projection of this column out of a record
    pub fn value<'a>(&self, record: &'a Record) -> Option<Cow<'a, FieldValue>> {
        record.get(&self.key)
    }

    /// Display projection; a missing field renders as an empty string.
    pub fn cell(&self, record: &Record) -> String {
        self.value(record).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Columns covering every field seen across `records`, id first, in
    /// first-seen order. Headers repeat the keys.
    pub fn infer<'a, I>(records: I) -> Vec<ColumnDescriptor>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut keys: Vec<&str> = Vec::new();
        for record in records {
            for key in record.field_names() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys.into_iter().map(|k| ColumnDescriptor::new(k, k)).collect()
    }
}
