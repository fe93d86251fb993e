//! Required-field validation

use crate::binder::BoundValues;
use crate::i18n::{I18n, DEFAULT_VALIDATION_REQUIRED, VALIDATION_REQUIRED};
use crate::schema::{composite_key, FormSchema};

/// Labels of required fields left empty, in schema order
pub fn validate_required(values: &BoundValues, schema: &FormSchema, i18n: &I18n) -> Vec<String> {
    schema
        .fields()
        .filter(|(_, field)| field.required)
        .filter(|(section, field)| {
            values
                .get(&composite_key(&section.key, &field.key))
                .trim()
                .is_empty()
        })
        .map(|(_, field)| i18n.label_for(field).to_string())
        .collect()
}

/// User-facing message listing the missing labels
pub fn missing_fields_message(i18n: &I18n, labels: &[String]) -> String {
    let mut message = i18n
        .get_or(VALIDATION_REQUIRED, DEFAULT_VALIDATION_REQUIRED)
        .to_string();
    for label in labels {
        message.push_str("\n- ");
        message.push_str(label);
    }
    message
}
