//! Per-device telemetry records.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldSchema, INDEX_FIELD};

/// Logical device identifier extracted from a record's `index` field.
pub type DeviceIndex = u32;

/// One parsed telemetry sample for one device at one point in time.
///
/// A record maps field names to raw string values, built by splitting one CSV
/// line on commas and zipping the trimmed tokens against the session's
/// [`FieldSchema`]. Tokens beyond the schema length are dropped; missing
/// trailing tokens leave those fields absent.
///
/// No type coercion happens here. nvidia-smi reports `N/A` or `Not Supported`
/// for fields a device lacks, and both literals pass through verbatim so a
/// consumer can distinguish them. Numeric interpretation is a consumer-side
/// convention via [`numeric_or`](Self::numeric_or) and the percentage
/// helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Build a record from one trimmed, non-empty CSV line.
    ///
    /// Purely structural: a malformed line simply yields a record with few or
    /// no populated fields. Rejection happens later, when the mandatory
    /// `index` field is absent or unparsable.
    pub fn parse(line: &str, schema: &FieldSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .zip(line.split(','))
            .map(|(name, token)| (name.clone(), token.trim().to_string()))
            .collect();
        Self { fields }
    }

    /// Raw value of a field, if the line carried a token for it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Raw value of a field, or a caller-defined default when absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// The device index this record belongs to, if parsable.
    ///
    /// Records without a parsable non-negative integer index are never
    /// dispatched.
    pub fn device_index(&self) -> Option<DeviceIndex> {
        self.get(INDEX_FIELD)?.parse().ok()
    }

    /// Numeric value of a field, falling back to `default` when the field is
    /// absent or non-numeric (`N/A`, `Not Supported`, garbage).
    pub fn numeric_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    /// Memory utilization as a whole percentage, `memory.used` over
    /// `memory.total`, clamped to 0..=100. Zero when the total is unknown.
    pub fn memory_percent(&self) -> u8 {
        Self::percent(self.numeric_or("memory.used", 0.0), self.numeric_or("memory.total", 0.0))
    }

    /// Power utilization as a whole percentage, `power.draw` over
    /// `enforced.power.limit`, clamped to 0..=100. Zero when the limit is
    /// unknown.
    pub fn power_percent(&self) -> u8 {
        Self::percent(
            self.numeric_or("power.draw", 0.0),
            self.numeric_or("enforced.power.limit", 0.0),
        )
    }

    fn percent(used: f64, total: f64) -> u8 {
        if total > 0.0 { (used * 100.0 / total).clamp(0.0, 100.0) as u8 } else { 0 }
    }

    /// Populated fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was populated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new(["index", "name", "memory.used", "memory.total"]).unwrap()
    }

    #[test]
    fn tokens_zip_against_schema_positionally() {
        let record = Record::parse("0, Card A, 500, 8000", &schema());
        assert_eq!(record.get("index"), Some("0"));
        assert_eq!(record.get("name"), Some("Card A"));
        assert_eq!(record.get("memory.used"), Some("500"));
        assert_eq!(record.get("memory.total"), Some("8000"));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn extra_tokens_are_dropped() {
        let record = Record::parse("0, Card A, 500, 8000, surplus, more", &schema());
        assert_eq!(record.len(), 4);
        assert_eq!(record.get("memory.total"), Some("8000"));
    }

    #[test]
    fn missing_trailing_tokens_leave_fields_absent() {
        let record = Record::parse("0, Card A", &schema());
        assert_eq!(record.get("index"), Some("0"));
        assert_eq!(record.get("name"), Some("Card A"));
        assert_eq!(record.get("memory.used"), None);
        assert_eq!(record.get_or("memory.used", "0"), "0");
    }

    #[test]
    fn sentinel_values_pass_through_verbatim() {
        let schema = FieldSchema::new(["index", "fan.speed", "temperature.gpu"]).unwrap();
        let record = Record::parse("0, Not Supported, N/A", &schema);
        assert_eq!(record.get("fan.speed"), Some("Not Supported"));
        assert_eq!(record.get("temperature.gpu"), Some("N/A"));
        // The two literals stay distinguishable to the consumer.
        assert_ne!(record.get("fan.speed"), record.get("temperature.gpu"));
    }

    #[test]
    fn device_index_parses_non_negative_integers_only() {
        let s = schema();
        assert_eq!(Record::parse("0, Card A", &s).device_index(), Some(0));
        assert_eq!(Record::parse("7, Card A", &s).device_index(), Some(7));
        assert_eq!(Record::parse("garbage,,,", &s).device_index(), None);
        assert_eq!(Record::parse("-1, Card A", &s).device_index(), None);
        assert_eq!(Record::parse("1.5, Card A", &s).device_index(), None);
        assert_eq!(Record::parse("N/A, Card A", &s).device_index(), None);
    }

    #[test]
    fn device_index_absent_when_schema_lacks_index() {
        let s = FieldSchema::new(["name", "memory.used"]).unwrap();
        assert_eq!(Record::parse("Card A, 500", &s).device_index(), None);
    }

    #[test]
    fn numeric_or_falls_back_on_sentinels() {
        let s = FieldSchema::new(["index", "power.draw"]).unwrap();
        let record = Record::parse("0, N/A", &s);
        assert_eq!(record.numeric_or("power.draw", 0.0), 0.0);
        assert_eq!(record.numeric_or("missing.field", 42.0), 42.0);

        let record = Record::parse("0, 215.5", &s);
        assert_eq!(record.numeric_or("power.draw", 0.0), 215.5);
    }

    #[test]
    fn memory_percent_from_used_and_total() {
        let record = Record::parse("0, Card A, 600, 8000", &schema());
        assert_eq!(record.memory_percent(), 7);

        let full = Record::parse("0, Card A, 8000, 8000", &schema());
        assert_eq!(full.memory_percent(), 100);
    }

    #[test]
    fn memory_percent_zero_when_total_unknown() {
        let record = Record::parse("0, Card A, 600, N/A", &schema());
        assert_eq!(record.memory_percent(), 0);

        let record = Record::parse("0, Card A, 600, 0", &schema());
        assert_eq!(record.memory_percent(), 0);
    }

    #[test]
    fn power_percent_clamped_above_limit() {
        let s = FieldSchema::new(["index", "power.draw", "enforced.power.limit"]).unwrap();
        let record = Record::parse("0, 260, 250", &s);
        assert_eq!(record.power_percent(), 100);

        let record = Record::parse("0, 125, 250", &s);
        assert_eq!(record.power_percent(), 50);
    }
}
