//! Form submission context passed to save hooks.

use std::collections::HashMap;

use super::entry::Entry;

/// Submitted form values and the entry being saved.
pub struct FormContext<'a> {
    values: HashMap<String, String>,
    entry: &'a mut dyn Entry,
}

impl<'a> FormContext<'a> {
    /// Create a context for saving `entry`.
    pub fn new(values: HashMap<String, String>, entry: &'a mut dyn Entry) -> Self {
        Self { values, entry }
    }

    /// Raw submitted value for a field.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// The entry being saved.
    pub fn entry(&self) -> &(dyn Entry + 'a) {
        &*self.entry
    }

    /// Mutable access to the entry being saved.
    pub fn entry_mut(&mut self) -> &mut (dyn Entry + 'a) {
        &mut *self.entry
    }
}
