//! Telemetry field schema.

use serde::{Deserialize, Serialize};

use crate::{MonitorError, Result};

/// Field names queried from nvidia-smi, in wire order.
///
/// Order is significant: it must match the order requested from the
/// collection command, because CSV values are mapped to names positionally.
pub const DEFAULT_GPU_FIELDS: [&str; 13] = [
    "index",
    "count",
    "pci.bus_id",
    "name",
    "uuid",
    "memory.used",
    "memory.total",
    "temperature.gpu",
    "power.draw",
    "enforced.power.limit",
    "clocks.current.graphics",
    "fan.speed",
    "utilization.gpu",
];

/// The field every record must carry to be dispatched.
pub const INDEX_FIELD: &str = "index";

/// Ordered list of telemetry field names expected per CSV line.
///
/// A schema is fixed for the lifetime of a session; it defines the positional
/// mapping from CSV columns to field names and the `--query-gpu=` fragment of
/// the collection command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    /// Create a schema from an ordered list of field names, with validation.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

        if fields.is_empty() {
            return Err(MonitorError::schema("schema must contain at least one field"));
        }
        for name in &fields {
            if name.trim().is_empty() {
                return Err(MonitorError::schema("schema field names must be non-empty"));
            }
            if name.contains(',') {
                return Err(MonitorError::schema(format!(
                    "field name '{name}' must not contain the field separator"
                )));
            }
        }

        Ok(Self { fields })
    }

    /// The ordered field names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields per line.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema is empty. Never true for a validated schema.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field name, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Whether the schema carries the mandatory device index field.
    pub fn has_index_field(&self) -> bool {
        self.position(INDEX_FIELD).is_some()
    }

    /// Render the comma-joined query fragment for the collection command,
    /// e.g. `index,name,memory.used`.
    pub fn query_fragment(&self) -> String {
        self.fields.join(",")
    }
}

impl Default for FieldSchema {
    /// The full nvidia-smi GPU query schema.
    fn default() -> Self {
        Self { fields: DEFAULT_GPU_FIELDS.iter().map(|s| s.to_string()).collect() }
    }
}
