//! Parameter schema model
//!
//! A schema document describes every tunable parameter of a model: its
//! declared type, default, bounds, enum values and presentation hints. Loading
//! resolves each property into a [`Parameter`] with exactly one inferred
//! [`ControlKind`], and resolves `x-groups` into ordered [`ParameterGroup`]s.

use crate::{Error, ParamValue, Result};
use serde::Deserialize;
use tracing::warn;

/// Name of the implicit group collecting parameters no `x-groups` entry lists
pub const DEFAULT_GROUP: &str = "Parameters";

/// Schema document as supplied by the model author
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "x-groups")]
    pub groups: Vec<GroupDocument>,
}

/// One entry of the `properties` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyDocument {
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, rename = "x-hint")]
    pub hint: Option<String>,
    #[serde(default, rename = "x-step")]
    pub step: Option<f64>,
    #[serde(default, rename = "maxLength")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry of the `x-groups` list
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDocument {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Declared JSON type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Number,
    Boolean,
    String,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Number)
    }
}

/// Kind of a parameter, as described by the data model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Number,
    Boolean,
    String,
    Enum,
    Color,
}

/// Input control inferred for a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Slider plus numeric echo, kept in sync
    Range { min: f64, max: f64, step: Option<f64> },
    /// On/off switch storing `on` or `off`
    Toggle { on: ParamValue, off: ParamValue },
    /// Dropdown over the literal enum values, in schema order
    Dropdown { options: Vec<ParamValue> },
    /// Color picker paired with an editable hex field
    Color,
    /// Bare numeric input
    Number { step: Option<f64> },
    /// Bare text input
    Text { max_length: Option<usize> },
}

impl ControlKind {
    pub fn label(&self) -> &'static str {
        match self {
            ControlKind::Range { .. } => "range",
            ControlKind::Toggle { .. } => "toggle",
            ControlKind::Dropdown { .. } => "dropdown",
            ControlKind::Color => "color",
            ControlKind::Number { .. } => "number",
            ControlKind::Text { .. } => "text",
        }
    }
}

/// A fully resolved parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub value_type: ValueType,
    pub default: ParamValue,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub step: Option<f64>,
    pub options: Vec<ParamValue>,
    pub hint: Option<String>,
    pub max_length: Option<usize>,
    pub group: String,
    pub title: String,
    pub description: Option<String>,
    pub control: ControlKind,
}

/// An ordered group of parameter names
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    pub name: String,
    pub label: String,
    pub parameters: Vec<String>,
}

/// Immutable, ordered description of all parameters of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    parameters: Vec<Parameter>,
    groups: Vec<ParameterGroup>,
}

impl ParameterSchema {
    /// Parse and load a schema document, rejecting any malformed property
    pub fn from_json(text: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(text)
            .map_err(|e| Error::InvalidSchema(e.to_string()))?;
        Self::load(&document)
    }

    /// Parse and load a schema document without ever failing.
    ///
    /// A document that is not valid JSON yields an empty schema; malformed
    /// property entries are skipped.
    pub fn from_json_lenient(text: &str) -> Self {
        match serde_json::from_str::<SchemaDocument>(text) {
            Ok(document) => Self::load_lenient(&document),
            Err(e) => {
                warn!("ignoring malformed schema document: {e}");
                Self::default()
            }
        }
    }

    /// Resolve a schema document
    pub fn load(document: &SchemaDocument) -> Result<Self> {
        let mut parameters = Vec::with_capacity(document.properties.len());
        for (name, raw) in &document.properties {
            parameters.push(resolve_property(name, raw)?);
        }
        Ok(Self::assemble(document, parameters))
    }

    /// Resolve a schema document, skipping properties that fail to resolve
    pub fn load_lenient(document: &SchemaDocument) -> Self {
        let parameters = document
            .properties
            .iter()
            .filter_map(|(name, raw)| match resolve_property(name, raw) {
                Ok(parameter) => Some(parameter),
                Err(e) => {
                    warn!("skipping schema property '{name}': {e}");
                    None
                }
            })
            .collect();
        Self::assemble(document, parameters)
    }

    fn assemble(document: &SchemaDocument, mut parameters: Vec<Parameter>) -> Self {
        let mut groups: Vec<ParameterGroup> = Vec::new();
        let mut assigned = vec![false; parameters.len()];

        for group in &document.groups {
            let mut members = Vec::new();
            for member in &group.parameters {
                match parameters.iter().position(|p| &p.name == member) {
                    Some(index) if !assigned[index] => {
                        assigned[index] = true;
                        parameters[index].group = group.name.clone();
                        members.push(member.clone());
                    }
                    Some(_) => warn!("parameter '{member}' already belongs to another group"),
                    None => warn!("group '{}' lists unknown parameter '{member}'", group.name),
                }
            }
            groups.push(ParameterGroup {
                name: group.name.clone(),
                label: group.label.clone().unwrap_or_else(|| group.name.clone()),
                parameters: members,
            });
        }

        let ungrouped: Vec<String> = parameters
            .iter()
            .zip(&assigned)
            .filter(|&(_, &done)| !done)
            .map(|(p, _)| p.name.clone())
            .collect();
        if !ungrouped.is_empty() {
            groups.push(ParameterGroup {
                name: DEFAULT_GROUP.to_string(),
                label: DEFAULT_GROUP.to_string(),
                parameters: ungrouped,
            });
        }

        Self {
            title: document.title.clone(),
            description: document.description.clone(),
            parameters,
            groups,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl Parameter {
    /// Check that `value`'s runtime type agrees with the declared type
    pub fn check(&self, value: &ParamValue) -> Result<()> {
        let ok = match (self.value_type, value) {
            (ValueType::Integer, ParamValue::Number(n)) => n.fract() == 0.0,
            (ValueType::Number, ParamValue::Number(n)) => n.is_finite(),
            (ValueType::Boolean, ParamValue::Bool(_)) => true,
            (ValueType::String, ParamValue::Text(_)) => true,
            _ => false,
        };
        if !ok {
            return Err(Error::TypeMismatch {
                name: self.name.clone(),
                expected: self.value_type.name(),
                found: value.type_name(),
            });
        }
        match self.choices() {
            Some(choices) if !choices.contains(&value) => Err(Error::TypeMismatch {
                name: self.name.clone(),
                expected: "one of the enum values",
                found: value.type_name(),
            }),
            _ => Ok(()),
        }
    }

    /// Values a dropdown or a text toggle is restricted to
    fn choices(&self) -> Option<Vec<&ParamValue>> {
        match &self.control {
            ControlKind::Dropdown { options } => Some(options.iter().collect()),
            ControlKind::Toggle { on, off } if self.value_type != ValueType::Boolean => {
                Some(vec![on, off])
            }
            _ => None,
        }
    }

    /// Round an integer onto its step grid, then keep it inside the bounds
    /// without leaving the grid
    fn snap_to_step(&self, number: f64) -> f64 {
        let step = self.step.filter(|s| *s > 0.0).unwrap_or(1.0);
        let base = self.minimum.unwrap_or(0.0);
        let mut snapped = base + ((number - base) / step).round() * step;
        if let Some(max) = self.maximum {
            if snapped > max {
                snapped = base + ((max - base) / step).floor() * step;
            }
        }
        if let Some(min) = self.minimum {
            snapped = snapped.max(min);
        }
        snapped.round()
    }

    /// Apply the coercions a control performs before storing a value.
    ///
    /// Numeric text is parsed and numbers are clamped into the declared bounds.
    /// Integers are rounded to the nearest step and never leave the bounds.
    /// Yes/no-like text becomes a boolean for boolean parameters and the
    /// matching token for text toggles. Dropdown text matches its option
    /// regardless of case. Color text is normalized, and plain text is
    /// truncated to the maximum length. Values that cannot be coerced are
    /// returned unchanged so [`Parameter::check`] can reject them.
    pub fn coerce(&self, value: ParamValue) -> ParamValue {
        match self.value_type {
            ValueType::Integer | ValueType::Number => {
                let parsed = match &value {
                    ParamValue::Number(n) => Some(*n),
                    ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
                    ParamValue::Bool(_) => None,
                };
                let Some(mut number) = parsed.filter(|n| n.is_finite()) else {
                    return value;
                };
                if self.value_type == ValueType::Integer {
                    return ParamValue::Number(self.snap_to_step(number));
                }
                if let Some(min) = self.minimum {
                    number = number.max(min);
                }
                if let Some(max) = self.maximum {
                    number = number.min(max);
                }
                ParamValue::Number(number)
            }
            ValueType::Boolean => {
                let parsed = value.as_str().and_then(truth_token);
                parsed.map(ParamValue::Bool).unwrap_or(value)
            }
            ValueType::String => match (&self.control, value) {
                (ControlKind::Color, ParamValue::Text(s)) => {
                    ParamValue::Text(normalize_color(&s).unwrap_or(s))
                }
                (ControlKind::Text { max_length: Some(max) }, ParamValue::Text(s)) => {
                    ParamValue::Text(s.chars().take(*max).collect())
                }
                (ControlKind::Toggle { on, off }, ParamValue::Text(s)) => match truth_token(&s) {
                    Some(true) => on.clone(),
                    Some(false) => off.clone(),
                    None => ParamValue::Text(s),
                },
                (ControlKind::Dropdown { options }, ParamValue::Text(s)) => options
                    .iter()
                    .find(|o| o.as_str().is_some_and(|t| t.eq_ignore_ascii_case(&s)))
                    .cloned()
                    .unwrap_or(ParamValue::Text(s)),
                (_, other) => other,
            },
        }
    }

    /// Value stored by a toggle control when switched on or off
    pub fn toggle_value(&self, on: bool) -> Option<ParamValue> {
        match &self.control {
            ControlKind::Toggle { on: on_value, off } => {
                Some(if on { on_value.clone() } else { off.clone() })
            }
            _ => None,
        }
    }

    /// Whether `value` reads as switched on for a toggle control
    pub fn is_on(&self, value: &ParamValue) -> bool {
        match value {
            ParamValue::Bool(b) => *b,
            ParamValue::Text(s) => truth_token(s).unwrap_or(false),
            ParamValue::Number(n) => *n != 0.0,
        }
    }
}

/// Map a yes/no/true/false token (any casing) to its truth value
fn truth_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

/// True for `#` followed by exactly six hex digits
pub fn is_hex_color(text: &str) -> bool {
    text.len() == 7
        && text.starts_with('#')
        && text[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize user color input to lowercase `#rrggbb`.
///
/// Accepts six or three hex digits with or without the leading `#`.
pub fn normalize_color(text: &str) -> Option<String> {
    let digits = text.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => Some(format!("#{}", digits.to_ascii_lowercase())),
        3 => {
            let expanded: String = digits
                .chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_lowercase();
            Some(format!("#{expanded}"))
        }
        _ => None,
    }
}

fn resolve_property(name: &str, raw: &serde_json::Value) -> Result<Parameter> {
    let property: PropertyDocument = serde_json::from_value(raw.clone())
        .map_err(|e| Error::InvalidSchema(format!("property '{name}': {e}")))?;

    let options: Vec<ParamValue> = property
        .enum_values
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(ParamValue::from_json)
        .collect();

    let value_type = match property.value_type {
        Some(value_type) => value_type,
        None => infer_value_type(property.default.as_ref(), &options).ok_or_else(|| {
            Error::InvalidSchema(format!("property '{name}' declares no type"))
        })?,
    };

    let color_hint = property
        .hint
        .as_deref()
        .is_some_and(|hint| hint.eq_ignore_ascii_case("color"));

    let kind = if color_hint {
        ParamKind::Color
    } else if !options.is_empty() {
        ParamKind::Enum
    } else {
        match value_type {
            ValueType::Integer => ParamKind::Integer,
            ValueType::Number => ParamKind::Number,
            ValueType::Boolean => ParamKind::Boolean,
            ValueType::String => ParamKind::String,
        }
    };

    let default = resolve_default(name, value_type, property.default.as_ref(), &options, &property)?;
    let control = infer_control(value_type, color_hint, &options, &default, &property);

    Ok(Parameter {
        name: name.to_string(),
        kind,
        value_type,
        default,
        minimum: property.minimum,
        maximum: property.maximum,
        step: property.step,
        options,
        hint: property.hint.clone(),
        max_length: property.max_length,
        group: DEFAULT_GROUP.to_string(),
        title: property.title.clone().unwrap_or_else(|| name.to_string()),
        description: property.description.clone(),
        control,
    })
}

fn infer_value_type(default: Option<&serde_json::Value>, options: &[ParamValue]) -> Option<ValueType> {
    let sample = default
        .and_then(ParamValue::from_json)
        .or_else(|| options.first().cloned())?;
    Some(match sample {
        ParamValue::Bool(_) => ValueType::Boolean,
        ParamValue::Number(_) => ValueType::Number,
        ParamValue::Text(_) => ValueType::String,
    })
}

fn resolve_default(
    name: &str,
    value_type: ValueType,
    raw: Option<&serde_json::Value>,
    options: &[ParamValue],
    property: &PropertyDocument,
) -> Result<ParamValue> {
    let declared = raw.and_then(ParamValue::from_json);
    let value = match (value_type, declared) {
        (_, None) => match options.first() {
            Some(first) => first.clone(),
            None => match value_type {
                ValueType::Integer | ValueType::Number => {
                    ParamValue::Number(property.minimum.unwrap_or(0.0))
                }
                ValueType::Boolean => ParamValue::Bool(false),
                ValueType::String => ParamValue::Text(String::new()),
            },
        },
        (ValueType::Boolean, Some(ParamValue::Text(token))) => match truth_token(&token) {
            Some(b) => ParamValue::Bool(b),
            None => ParamValue::Text(token),
        },
        (_, Some(value)) => value,
    };

    let valid = match (value_type, &value) {
        (ValueType::Integer, ParamValue::Number(n)) => n.fract() == 0.0,
        (ValueType::Number, ParamValue::Number(_)) => true,
        (ValueType::Boolean, ParamValue::Bool(_)) => true,
        (ValueType::String, ParamValue::Text(_)) => true,
        _ => false,
    };
    if valid {
        Ok(value)
    } else {
        Err(Error::InvalidSchema(format!(
            "property '{name}' default {value} is not a valid {}",
            value_type.name()
        )))
    }
}

/// Split a two-valued yes/no-like enum into its (on, off) tokens
fn boolean_like_pair(options: &[ParamValue]) -> Option<(ParamValue, ParamValue)> {
    if options.len() != 2 {
        return None;
    }
    let truth = |value: &ParamValue| match value {
        ParamValue::Text(s) => truth_token(s),
        ParamValue::Bool(b) => Some(*b),
        ParamValue::Number(_) => None,
    };
    match (truth(&options[0])?, truth(&options[1])?) {
        (true, false) => Some((options[0].clone(), options[1].clone())),
        (false, true) => Some((options[1].clone(), options[0].clone())),
        _ => None,
    }
}

fn infer_control(
    value_type: ValueType,
    color_hint: bool,
    options: &[ParamValue],
    default: &ParamValue,
    property: &PropertyDocument,
) -> ControlKind {
    if value_type.is_numeric() && !color_hint {
        if let (Some(min), Some(max)) = (property.minimum, property.maximum) {
            return ControlKind::Range {
                min,
                max,
                step: property.step,
            };
        }
    }

    if let Some((on, off)) = boolean_like_pair(options) {
        if value_type == ValueType::Boolean {
            return ControlKind::Toggle {
                on: ParamValue::Bool(true),
                off: ParamValue::Bool(false),
            };
        }
        return ControlKind::Toggle { on, off };
    }

    if !options.is_empty() {
        return ControlKind::Dropdown {
            options: options.to_vec(),
        };
    }

    if color_hint || default.as_str().is_some_and(is_hex_color) {
        return ControlKind::Color;
    }

    if value_type.is_numeric() {
        return ControlKind::Number {
            step: property.step,
        };
    }

    if value_type == ValueType::Boolean {
        return ControlKind::Toggle {
            on: ParamValue::Bool(true),
            off: ParamValue::Bool(false),
        };
    }

    ControlKind::Text {
        max_length: property.max_length,
    }
}
