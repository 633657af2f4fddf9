use crate::value::Value;
use std::collections::HashMap;

/// String-keyed associative map backing objects, scope frames, and the
/// interpreter registries. Entries keep insertion order, which makes object
/// rendering and `for key in obj` deterministic; a side index gives O(1)
/// amortized lookups.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update. Updating keeps the key's original position.
    pub fn set(&mut self, key: &str, value: Value) {
        if let Some(&slot) = self.index.get(key) {
            self.entries[slot].1 = value;
        } else {
            self.index.insert(key.to_string(), self.entries.len());
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn has(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a key. The remaining entries keep their relative order.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.entries.remove(slot);
                for other in self.index.values_mut() {
                    if *other > slot {
                        *other -= 1;
                    }
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Collect the keys as an array value, in insertion order.
    pub fn keys_value(&self) -> Value {
        Value::array(
            self.entries
                .iter()
                .map(|(k, _)| Value::Str(k.clone()))
                .collect(),
        )
    }

    /// Collect the values as an array value, in insertion order.
    pub fn values_value(&self) -> Value {
        Value::array(self.entries.iter().map(|(_, v)| v.clone()).collect())
    }
}
