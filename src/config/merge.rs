use toml::map::Entry;
use toml::{Table, Value};

/// Merges `overlay` into `base`.
///
/// Tables merge key by key, arrays of tables are appended in layer order and
/// every other value is replaced by the overlay.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, incoming) in overlay {
        match base.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => merge_value(slot.get_mut(), incoming),
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Table(existing), Value::Table(incoming)) => merge_tables(existing, incoming),
        (Value::Array(existing), Value::Array(incoming)) => {
            if is_array_of_tables(existing) && is_array_of_tables(&incoming) {
                existing.extend(incoming);
            } else {
                *existing = incoming;
            }
        }
        (existing, incoming) => *existing = incoming,
    }
}

fn is_array_of_tables(values: &[Value]) -> bool {
    !values.is_empty() && values.iter().all(Value::is_table)
}
