//! Shareable parameter state
//!
//! Parameter state travels in links as a percent-encoded JSON object, safe to
//! use as a URL fragment. Decoding is permissive: anything malformed decodes
//! to "no change" so a hand-edited link can never break a session.

use meshtune_core::{ParamValue, ParameterSchema, ParameterState, PartialState};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, warn};

/// Characters left intact, matching `encodeURIComponent`
const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode the whole state
pub fn encode(state: &ParameterState) -> String {
    let object: serde_json::Map<String, serde_json::Value> = state
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_json()))
        .collect();
    let json = serde_json::Value::Object(object).to_string();
    utf8_percent_encode(&json, FRAGMENT).to_string()
}

/// Decode a representation produced by [`encode`] (a leading `#` is allowed).
///
/// Returns an empty partial state for malformed input. Non-scalar values are
/// dropped individually.
pub fn decode(representation: &str) -> PartialState {
    let trimmed = representation.trim().trim_start_matches('#');
    if trimmed.is_empty() {
        return PartialState::new();
    }

    let json = match percent_decode_str(trimmed).decode_utf8() {
        Ok(json) => json,
        Err(e) => {
            warn!("ignoring share link that is not UTF-8: {e}");
            return PartialState::new();
        }
    };

    let object = match serde_json::from_str::<serde_json::Value>(&json) {
        Ok(serde_json::Value::Object(object)) => object,
        Ok(_) => {
            warn!("ignoring share link that is not a JSON object");
            return PartialState::new();
        }
        Err(e) => {
            warn!("ignoring malformed share link: {e}");
            return PartialState::new();
        }
    };

    let mut partial = PartialState::new();
    for (name, value) in &object {
        match ParamValue::from_json(value) {
            Some(value) => partial.insert(name.clone(), value),
            None => debug!("dropping non-scalar shared value for '{name}'"),
        }
    }
    partial
}

/// Two-way binding between a parameter state and its shareable representation.
///
/// `publish` is called after every local mutation and yields the new
/// representation only when it changed. `observe` applies an externally changed
/// representation as an overlay and records it, so the change is never
/// published back.
#[derive(Debug, Clone, Default)]
pub struct ShareSync {
    current: Option<String>,
}

impl ShareSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial state: schema defaults overlaid with `representation`
    pub fn load(&mut self, schema: &ParameterSchema, representation: Option<&str>) -> ParameterState {
        let mut state = ParameterState::defaults(schema);
        if let Some(representation) = representation {
            let applied = state.overlay(schema, &decode(representation));
            debug!("share link overrode {applied} parameter(s)");
        }
        self.current = Some(encode(&state));
        state
    }

    /// Representation last published or observed
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Re-encode `state`; returns the representation if it differs from the
    /// last one published or observed
    pub fn publish(&mut self, state: &ParameterState) -> Option<String> {
        let encoded = encode(state);
        if self.current.as_deref() == Some(encoded.as_str()) {
            return None;
        }
        self.current = Some(encoded.clone());
        Some(encoded)
    }

    /// Apply an externally changed representation on top of `state`.
    ///
    /// Echoes of our own publications are ignored. Returns whether any
    /// parameter changed.
    pub fn observe(
        &mut self,
        schema: &ParameterSchema,
        state: &mut ParameterState,
        representation: &str,
    ) -> bool {
        let normalized = representation.trim().trim_start_matches('#');
        if self.current.as_deref() == Some(normalized) {
            return false;
        }
        let changed = state.overlay(schema, &decode(normalized));
        self.current = Some(encode(state));
        changed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ParameterSchema {
        let document = json!({
            "properties": {
                "width": { "type": "integer", "minimum": 1, "maximum": 100, "default": 50 },
                "enabled": { "type": "boolean", "default": true },
                "label": { "type": "string", "default": "a b/c" },
                "color": { "type": "string", "default": "#1a2b3c" }
            }
        });
        ParameterSchema::from_json(&document.to_string()).unwrap()
    }

    #[test]
    fn test_encoding_is_fragment_safe() {
        let state = ParameterState::defaults(&schema());
        let encoded = encode(&state);
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.!~*'()%".contains(c)));
        assert!(encoded.starts_with("%7B%22width%22%3A50"));
    }

    #[test]
    fn test_decode_overlay_of_encode_is_noop() {
        let schema = schema();
        let mut state = ParameterState::defaults(&schema);
        state.set(&schema, "width", 7.into()).unwrap();
        state.set(&schema, "label", "quote \" and %".into()).unwrap();

        let before = state.clone();
        let applied = state.overlay(&schema, &decode(&encode(&before)));
        assert_eq!(applied, 0);
        assert_eq!(state, before);
    }

    #[test]
    fn test_round_trip_keeps_values_controls_would_normalize() {
        let document = json!({
            "properties": {
                "width": { "type": "integer", "minimum": 0, "maximum": 100, "x-step": 5, "default": 10 },
                "ratio": { "type": "number", "minimum": 0, "maximum": 1, "default": 0.5 },
                "tint": { "type": "string", "x-hint": "color", "default": "#112233" },
                "label": { "type": "string", "maxLength": 3, "default": "abc" }
            }
        });
        let schema = ParameterSchema::from_json(&document.to_string()).unwrap();
        let mut state = ParameterState::defaults(&schema);
        state.set(&schema, "width", 7.into()).unwrap();
        state.set(&schema, "ratio", 2.5.into()).unwrap();
        state.set(&schema, "tint", "#ABCDEF".into()).unwrap();
        state.set(&schema, "label", "abcdef".into()).unwrap();

        let before = state.clone();
        assert_eq!(state.overlay(&schema, &decode(&encode(&before))), 0);
        assert_eq!(state, before);

        let mut fresh = ParameterState::defaults(&schema);
        assert_eq!(fresh.overlay(&schema, &decode(&encode(&before))), 4);
        assert_eq!(fresh, before);
    }

    #[test]
    fn test_malformed_input_decodes_to_nothing() {
        assert!(decode("").is_empty());
        assert!(decode("#%7Bnot json").is_empty());
        assert!(decode("%FF%FE").is_empty());
        assert!(decode("%5B1%2C2%5D").is_empty());
    }

    #[test]
    fn test_load_overlays_known_keys_only() {
        let schema = schema();
        let link = format!("#{}", utf8_percent_encode(r#"{"width":12,"ghost":1,"color":[1]}"#, FRAGMENT));

        let mut sync = ShareSync::new();
        let state = sync.load(&schema, Some(&link));
        assert_eq!(state.get("width"), Some(&ParamValue::Number(12.0)));
        assert_eq!(state.get("enabled"), Some(&ParamValue::Bool(true)));
        assert_eq!(state.get("color"), Some(&ParamValue::from("#1a2b3c")));
    }

    #[test]
    fn test_publish_only_on_change() {
        let schema = schema();
        let mut sync = ShareSync::new();
        let mut state = sync.load(&schema, None);

        assert_eq!(sync.publish(&state), None);
        state.set(&schema, "enabled", false.into()).unwrap();
        let published = sync.publish(&state).unwrap();
        assert_eq!(sync.current(), Some(published.as_str()));
        assert_eq!(sync.publish(&state), None);
    }

    #[test]
    fn test_observe_overlays_without_republishing() {
        let schema = schema();
        let mut sync = ShareSync::new();
        let mut state = sync.load(&schema, None);

        let link = utf8_percent_encode(r#"{"width":80}"#, FRAGMENT).to_string();
        assert!(sync.observe(&schema, &mut state, &link));
        assert_eq!(state.get("width"), Some(&ParamValue::Number(80.0)));
        assert_eq!(state.get("label"), Some(&ParamValue::from("a b/c")));
        assert_eq!(sync.publish(&state), None);

        // Our own representation coming back is not applied again.
        let own = sync.current().unwrap().to_string();
        assert!(!sync.observe(&schema, &mut state, &own));
    }
}
