//! Parameterized model source
//!
//! The compute engine receives plain model source text. Current parameter
//! values are injected as a block of assignment lines placed in front of the
//! untouched base template, one `name = value;` line per parameter in state
//! order.

use meshtune_core::{ParamValue, ParameterState};

/// Render one assignment line, including its trailing newline.
///
/// Strings are wrapped in double quotes verbatim; embedded quotes are not
/// escaped.
pub fn assignment_line(name: &str, value: &ParamValue) -> String {
    match value {
        ParamValue::Text(text) => format!("{name} = \"{text}\";\n"),
        ParamValue::Bool(flag) => format!("{name} = {};\n", if *flag { "true" } else { "false" }),
        ParamValue::Number(_) => format!("{name} = {value};\n"),
    }
}

/// Assignment block for every parameter in `state`
pub fn parameter_prefix(state: &ParameterState) -> String {
    let mut prefix = String::new();
    for (name, value) in state.iter() {
        prefix.push_str(&assignment_line(name, value));
    }
    prefix
}

/// Final source text: the assignment block followed by the base template
pub fn parameterize(state: &ParameterState, template: &str) -> String {
    let mut source = parameter_prefix(state);
    source.push_str(template);
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshtune_core::ParameterSchema;
    use serde_json::json;

    fn state_for(properties: serde_json::Value) -> (ParameterSchema, ParameterState) {
        let document = json!({ "properties": properties });
        let schema = ParameterSchema::from_json(&document.to_string()).unwrap();
        let state = ParameterState::defaults(&schema);
        (schema, state)
    }

    #[test]
    fn test_number_and_bool_lines() {
        let (_, state) = state_for(json!({
            "width": { "type": "number", "default": 50 },
            "enabled": { "type": "boolean", "default": true }
        }));
        assert_eq!(
            parameterize(&state, "cube(1);"),
            "width = 50;\nenabled = true;\ncube(1);"
        );
    }

    #[test]
    fn test_strings_are_quoted_and_template_untouched() {
        let (schema, mut state) = state_for(json!({
            "label": { "type": "string", "default": "lid" },
            "ratio": { "type": "number", "default": 0.5 }
        }));
        state.set(&schema, "ratio", 1.25.into()).unwrap();

        let template = "// width = 1;\ntext(label);\n";
        let source = parameterize(&state, template);
        assert_eq!(source, "label = \"lid\";\nratio = 1.25;\n// width = 1;\ntext(label);\n");
        assert!(source.ends_with(template));
    }

    #[test]
    fn test_embedded_quotes_are_not_escaped() {
        let (schema, mut state) = state_for(json!({
            "label": { "type": "string", "default": "" }
        }));
        state.set(&schema, "label", "say \"hi\"".into()).unwrap();

        // Known edge case: the quote terminates the string literal early.
        assert_eq!(parameter_prefix(&state), "label = \"say \"hi\"\";\n");
    }

    #[test]
    fn test_yes_no_tokens_stay_strings() {
        let (_, state) = state_for(json!({
            "hollow": { "type": "string", "enum": ["Yes", "No"], "default": "Yes" }
        }));
        assert_eq!(parameter_prefix(&state), "hollow = \"Yes\";\n");
    }

    #[test]
    fn test_empty_state_leaves_template() {
        let (_, state) = state_for(json!({}));
        assert_eq!(parameterize(&state, "sphere(2);"), "sphere(2);");
    }
}
