//! Field storage and validation engine
//!
//! `FormCore` holds values, validation rules and messages of one form. It never notifies
//! anybody: every mutating operation reports the fields it touched and the owning `FormCtrl`
//! decides what to invalidate.

use super::field::{
    is_empty_value, ChangeEvent, FieldData, FieldId, FieldMessage, FieldValidation, FormOptions,
    FormValues, MessageKind, ValidationEvent,
};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct FormCore {
    values: FormValues,
    validation: HashMap<FieldId, FieldValidation>,
    validation_event: ValidationEvent,
    /// Messages supplied from outside (server errors, hints)
    messages: HashMap<FieldId, Vec<FieldMessage>>,
    /// Messages produced by the last validation run
    validation_messages: HashMap<FieldId, Vec<FieldMessage>>,
    touched: HashSet<FieldId>,
    dirty: HashSet<FieldId>,
}

impl FormCore {
    pub fn new(options: FormOptions) -> Self {
        Self {
            values: options.values.unwrap_or_default(),
            validation: options.validation,
            validation_event: options.validation_event.unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Every field that has a value, rules or messages
    pub fn field_ids(&self) -> Vec<FieldId> {
        let ids: BTreeSet<&FieldId> = self
            .values
            .keys()
            .chain(self.validation.keys())
            .chain(self.messages.keys())
            .collect();
        ids.into_iter().cloned().collect()
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, field: &FieldId) -> Option<&Value> {
        self.values.get(field)
    }

    /// Replace all values, dropping validation results and interaction state
    pub fn reset_values(&mut self, values: FormValues) {
        self.values = values;
        self.validation_messages.clear();
        self.touched.clear();
        self.dirty.clear();
    }

    /// Merge values into the form, leaving other fields alone
    pub fn set_values(&mut self, values: FormValues) -> Vec<FieldId> {
        let fields: Vec<FieldId> = values.keys().cloned().collect();
        for (field, value) in values {
            self.values.insert(field.clone(), value);
            self.revalidate_on(&field, ValidationEvent::Change);
        }
        fields
    }

    pub fn handle_change(&mut self, field: &FieldId, event: &ChangeEvent) {
        self.values.insert(field.clone(), event.value.clone());
        self.dirty.insert(field.clone());
        self.revalidate_on(field, ValidationEvent::Change);
    }

    pub fn handle_blur(&mut self, field: &FieldId) {
        self.touched.insert(field.clone());
        if self.validation_event == ValidationEvent::Blur {
            self.validate_field(field);
        }
    }

    pub fn set_field_validation(&mut self, field: &FieldId, update: FieldValidation) {
        self.validation.entry(field.clone()).or_default().merge(update);
        // Rules changed under an already validated field
        if self.validation_messages.contains_key(field) {
            self.validate_field(field);
        }
    }

    pub fn reset_field_messages(&mut self, field: &FieldId, messages: Vec<FieldMessage>) {
        self.messages.insert(field.clone(), messages);
    }

    pub fn add_field_messages(&mut self, field: &FieldId, messages: Vec<FieldMessage>) {
        self.messages
            .entry(field.clone())
            .or_default()
            .extend(messages);
    }

    /// Run the rules of one field, returns true when it has no error
    pub fn validate_field(&mut self, field: &FieldId) -> bool {
        let found = self.run_rules(field);
        let valid = !found.iter().any(|m| m.kind == MessageKind::Error);
        self.validation_messages.insert(field.clone(), found);
        valid
    }

    /// Run the rules of every known field
    pub fn validate(&mut self) -> bool {
        let mut valid = true;
        for field in self.field_ids() {
            valid &= self.validate_field(&field);
        }
        valid
    }

    pub fn field_data(&self, field: &FieldId) -> FieldData {
        let messages: Vec<FieldMessage> = self
            .messages
            .get(field)
            .into_iter()
            .chain(self.validation_messages.get(field))
            .flatten()
            .cloned()
            .collect();
        let error = messages.iter().any(|m| m.kind == MessageKind::Error);
        let warning = !error && messages.iter().any(|m| m.kind == MessageKind::Warning);

        FieldData {
            value: self.values.get(field).cloned().unwrap_or(Value::Null),
            messages,
            error,
            warning,
            required: self.validation.get(field).is_some_and(|v| v.is_required()),
            touched: self.touched.contains(field),
            dirty: self.dirty.contains(field),
        }
    }

    fn revalidate_on(&mut self, field: &FieldId, event: ValidationEvent) {
        if self.validation_event == event {
            self.validate_field(field);
        }
    }

    fn run_rules(&self, field: &FieldId) -> Vec<FieldMessage> {
        let Some(rules) = self.validation.get(field) else {
            return Vec::new();
        };
        let value = self.values.get(field).unwrap_or(&Value::Null);

        if let Some(required) = rules.required.as_ref().filter(|r| r.is_required()) {
            let empty = match &rules.required_validate {
                Some(check) => check(value),
                None => is_empty_value(value),
            };
            if empty {
                // An empty required field reports only that
                return required.message().into_iter().collect();
            }
        }

        rules
            .validators
            .iter()
            .filter_map(|rule| rule(value, &self.values))
            .collect()
    }
}
