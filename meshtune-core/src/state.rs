//! Parameter state store

use crate::{Error, ParamValue, ParameterSchema, Result};
use tracing::{debug, warn};

/// Current value of every parameter, in schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterState {
    values: Vec<(String, ParamValue)>,
}

/// Values decoded from an external source, not yet checked against a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterState {
    /// State holding every parameter's declared default
    pub fn defaults(schema: &ParameterSchema) -> Self {
        Self {
            values: schema
                .parameters()
                .iter()
                .map(|p| (p.name.clone(), p.default.clone()))
                .collect(),
        }
    }

    /// Replace the whole state with schema defaults
    pub fn reset(schema: &ParameterSchema) -> Self {
        Self::defaults(schema)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set one parameter.
    ///
    /// Fails with [`Error::UnknownParameter`] for names outside the schema and
    /// with [`Error::TypeMismatch`] when the value disagrees with the declared
    /// type. Nothing is changed on failure.
    pub fn set(&mut self, schema: &ParameterSchema, name: &str, value: ParamValue) -> Result<()> {
        let parameter = schema
            .get(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        parameter.check(&value)?;

        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name.to_string(), value)),
        }
        Ok(())
    }

    /// Apply decoded values on top of the current state.
    ///
    /// Values the parameter already accepts are stored as they are; anything
    /// else is coerced the way its control would coerce it. Unknown keys and
    /// values that stay invalid are ignored. Returns the number of parameters
    /// whose value actually changed.
    pub fn overlay(&mut self, schema: &ParameterSchema, partial: &PartialState) -> usize {
        let mut changed = 0;
        for (name, value) in partial.iter() {
            let Some(parameter) = schema.get(name) else {
                debug!("ignoring unknown shared parameter '{name}'");
                continue;
            };
            let value = match parameter.check(value) {
                Ok(()) => value.clone(),
                Err(_) => parameter.coerce(value.clone()),
            };
            if self.get(name) == Some(&value) {
                continue;
            }
            match self.set(schema, name, value) {
                Ok(()) => changed += 1,
                Err(e) => warn!("ignoring shared value: {e}"),
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping first-insertion order
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&ParameterState> for PartialState {
    fn from(state: &ParameterState) -> Self {
        Self {
            entries: state.values.clone(),
        }
    }
}
