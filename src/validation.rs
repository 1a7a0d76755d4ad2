use crate::errors::ValidationError;
use crate::types::{FieldValue, Record, RecordId, ID_FIELD};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Required fields for the document dashboard
pub const DEFAULT_REQUIRED_FIELDS: [&str; 5] = ["id", "name", "category", "date", "size"];

/// A raw record turned away during validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Position in the raw input, `None` when the whole input was rejected
    pub index: Option<usize>,
    pub id: Option<RecordId>,
    pub reason: ValidationError,
}

/// Outcome of validating a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub records: Vec<Record>,
    pub rejected: Vec<Rejection>,
}

impl ValidationReport {
    pub fn accepted_count(&self) -> usize {
        self.records.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Gatekeeper between raw input and the record store.
///
/// A raw record passes when it is a JSON object whose required fields are all
/// present and non-null and whose id is an integer or string. The first
/// record with a given id wins; later ones are rejected as duplicates.
#[derive(Debug, Clone)]
pub struct Validator {
    required: Vec<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_FIELDS)
    }
}

impl Validator {
    /// `id` is always required, whether or not it is listed.
    pub fn new<I, S>(required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut required = vec![ID_FIELD.to_string()];
        for field in required_fields {
            let field = field.as_ref();
            if !required.iter().any(|f| f == field) {
                required.push(field.to_string());
            }
        }
        Self { required }
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// Validates a batch. Never fails: anything that is not an array yields an
    /// empty report carrying a single whole-input rejection.
    pub fn validate(&self, raw: &serde_json::Value) -> ValidationReport {
        let items = match raw.as_array() {
            Some(items) => items,
            None => {
                error!("Records must be an array, got {}", json_kind(raw));
                return ValidationReport {
                    records: Vec::new(),
                    rejected: vec![Rejection {
                        index: None,
                        id: None,
                        reason: ValidationError::NotAnArray,
                    }],
                };
            }
        };

        let mut report = ValidationReport {
            records: Vec::with_capacity(items.len()),
            rejected: Vec::new(),
        };
        let mut seen: HashSet<RecordId> = HashSet::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match self.validate_one(item) {
                Ok(record) => {
                    if seen.insert(record.id().clone()) {
                        report.records.push(record);
                    } else {
                        let id = record.id().clone();
                        warn!("Invalid record at index {}: duplicate id {}", index, id);
                        report.rejected.push(Rejection {
                            index: Some(index),
                            id: Some(id.clone()),
                            reason: ValidationError::duplicate(id),
                        });
                    }
                }
                Err(reason) => {
                    warn!("Invalid record at index {}: {} ({})", index, reason, item);
                    report.rejected.push(Rejection {
                        index: Some(index),
                        id: item.get(ID_FIELD).and_then(RecordId::from_json),
                        reason,
                    });
                }
            }
        }

        debug!(
            "Validated {} raw records: {} accepted, {} rejected",
            items.len(),
            report.accepted_count(),
            report.rejected_count()
        );
        report
    }

    fn validate_one(&self, item: &serde_json::Value) -> Result<Record, ValidationError> {
        let object = item.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|field| object.get(field.as_str()).map_or(true, |v| v.is_null()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::missing(missing));
        }

        let id = object
            .get(ID_FIELD)
            .and_then(RecordId::from_json)
            .ok_or(ValidationError::InvalidId)?;

        let mut record = Record::new(id);
        for (key, value) in object {
            if key == ID_FIELD {
                continue;
            }
            match FieldValue::from_json(value) {
                Some(scalar) => record.insert(key, scalar),
                None if value.is_null() => {}
                None => debug!("Dropping non-scalar field '{}' from record {}", key, record.id()),
            }
        }

        if let Some(field) = self.required.iter().find(|f| !record.has_field(f)) {
            // Required field held an array or object
            return Err(ValidationError::missing(vec![field.clone()]));
        }

        Ok(record)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
