/// Property-list serializer for shortcut documents
///
/// Maps the typed document onto XML plist nodes. Dictionaries keep insertion
/// order, and every key below is inserted in a fixed sequence, so identical
/// documents always produce identical bytes.

use crate::error::ShortcutError;
use crate::shortcut::types::{
    ActionStep, DocumentMetadata, FieldValue, ParameterValue, PayloadField, RuntimePlaceholder,
    WorkflowDocument,
};
use plist::{Dictionary, Value};

/// MIME type of serialized shortcuts
pub const SHORTCUT_CONTENT_TYPE: &str = "application/x-plist";

/// File extension of serialized shortcuts
pub const SHORTCUT_EXTENSION: &str = "shortcut";

/// Object replacement character standing in for a runtime attachment
const ATTACHMENT_MARKER: &str = "\u{FFFC}";

/// Encode a document as an XML property list
pub fn serialize(document: &WorkflowDocument) -> Result<Vec<u8>, ShortcutError> {
    let mut bytes = Vec::new();
    document_value(document).to_writer_xml(&mut bytes)?;
    Ok(bytes)
}

/// Build the property-list tree for a document
pub fn document_value(document: &WorkflowDocument) -> Value {
    let mut root = Dictionary::new();
    root.insert(
        "WFWorkflowActions".to_string(),
        Value::Array(document.steps().into_iter().map(action_value).collect()),
    );
    insert_metadata(&mut root, document.metadata());
    Value::Dictionary(root)
}

fn insert_metadata(root: &mut Dictionary, metadata: &DocumentMetadata) {
    root.insert("WFWorkflowClientVersion".to_string(), metadata.client_version.into());
    root.insert("WFWorkflowClientRelease".to_string(), metadata.client_release.into());
    root.insert(
        "WFWorkflowMinimumClientVersion".to_string(),
        Value::Integer(metadata.minimum_client_version.into()),
    );
    root.insert(
        "WFWorkflowMinimumClientRelease".to_string(),
        metadata.minimum_client_release.into(),
    );

    let mut icon = Dictionary::new();
    icon.insert(
        "WFWorkflowIconStartColor".to_string(),
        Value::Integer(metadata.icon.start_color.into()),
    );
    icon.insert(
        "WFWorkflowIconGlyphNumber".to_string(),
        Value::Integer(metadata.icon.glyph_number.into()),
    );
    root.insert("WFWorkflowIcon".to_string(), Value::Dictionary(icon));

    root.insert("WFWorkflowTypes".to_string(), string_array(metadata.workflow_types));
    root.insert(
        "WFWorkflowInputContentItemClasses".to_string(),
        string_array(metadata.input_content_classes),
    );
}

fn action_value(step: &ActionStep) -> Value {
    let mut parameters = Dictionary::new();
    for (name, value) in step.parameters() {
        parameters.insert(name.to_string(), parameter_value(value));
    }
    parameters.insert(
        "UUID".to_string(),
        Value::String(format!("{:X}", step.correlation_token())),
    );

    let mut action = Dictionary::new();
    action.insert(
        "WFWorkflowActionIdentifier".to_string(),
        step.kind().identifier().into(),
    );
    action.insert("WFWorkflowActionParameters".to_string(), Value::Dictionary(parameters));
    Value::Dictionary(action)
}

fn parameter_value(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Text(text) => Value::String(text.clone()),
        ParameterValue::JsonBody(fields) => {
            let mut items = Dictionary::new();
            items.insert(
                "WFDictionaryFieldValueItems".to_string(),
                Value::Array(fields.iter().map(field_item).collect()),
            );

            let mut body = Dictionary::new();
            body.insert("Value".to_string(), Value::Dictionary(items));
            body.insert("WFSerializationType".to_string(), "WFDictionaryFieldValue".into());
            Value::Dictionary(body)
        }
    }
}

/// Dictionary-field item with a text key and text value (item type 0)
fn field_item(field: &PayloadField) -> Value {
    let mut item = Dictionary::new();
    item.insert("WFItemType".to_string(), Value::Integer(0u64.into()));
    item.insert("WFKey".to_string(), text_token(&field.key, None));
    let value = match &field.value {
        FieldValue::Literal(text) => text_token(text, None),
        FieldValue::Placeholder(placeholder) => text_token(ATTACHMENT_MARKER, Some(*placeholder)),
    };
    item.insert("WFValue".to_string(), value);
    Value::Dictionary(item)
}

fn text_token(text: &str, attachment: Option<RuntimePlaceholder>) -> Value {
    let mut attachments = Dictionary::new();
    if let Some(placeholder) = attachment {
        let mut variable = Dictionary::new();
        variable.insert("Type".to_string(), placeholder.attachment_type().into());
        attachments.insert("{0, 1}".to_string(), Value::Dictionary(variable));
    }

    let mut inner = Dictionary::new();
    inner.insert("string".to_string(), text.into());
    inner.insert("attachmentsByRange".to_string(), Value::Dictionary(attachments));

    let mut token = Dictionary::new();
    token.insert("Value".to_string(), Value::Dictionary(inner));
    token.insert("WFSerializationType".to_string(), "WFTextTokenString".into());
    Value::Dictionary(token)
}

fn string_array(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|value| Value::String(value.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::builder::build_document;
    use std::io::Cursor;

    fn decode(bytes: &[u8]) -> Value {
        Value::from_reader(Cursor::new(bytes)).unwrap()
    }

    /// Walk a chain of dictionary keys
    fn at<'a>(value: &'a Value, path: &[&str]) -> &'a Value {
        path.iter().fold(value, |node, key| {
            node.as_dictionary()
                .and_then(|dict| dict.get(key))
                .unwrap_or_else(|| panic!("missing key {}", key))
        })
    }

    fn actions(root: &Value) -> &Vec<Value> {
        at(root, &["WFWorkflowActions"]).as_array().unwrap()
    }

    fn body_items(root: &Value) -> &Vec<Value> {
        at(
            &actions(root)[1],
            &["WFWorkflowActionParameters", "WFJSONValues", "Value", "WFDictionaryFieldValueItems"],
        )
        .as_array()
        .unwrap()
    }

    fn text_of(token: &Value) -> &str {
        at(token, &["Value", "string"]).as_string().unwrap()
    }

    #[test]
    fn output_is_xml_plist() {
        let bytes = serialize(&build_document("u1", "https://x/webhook").unwrap()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<plist version=\"1.0\">"));
        assert!(text.contains("<string>is.workflow.actions.geturl</string>"));
    }

    #[test]
    fn serialization_is_deterministic() {
        let first = serialize(&build_document("u1", "https://x/webhook").unwrap()).unwrap();
        let second = serialize(&build_document("u1", "https://x/webhook").unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn decoded_document_carries_inputs() {
        let document = build_document("user & <co>", "https://x/webhook?a=1&b=2").unwrap();
        let root = decode(&serialize(&document).unwrap());
        assert_eq!(actions(&root).len(), 2);

        let fetch = &actions(&root)[0];
        assert_eq!(
            at(fetch, &["WFWorkflowActionIdentifier"]).as_string(),
            Some("is.workflow.actions.geturl")
        );
        assert_eq!(
            at(fetch, &["WFWorkflowActionParameters", "WFURLActionURL"]).as_string(),
            Some("https://x/webhook?a=1&b=2")
        );
        assert_eq!(
            at(fetch, &["WFWorkflowActionParameters", "UUID"]).as_string(),
            Some("A1B2C3D4-E5F6-7890-ABCD-EF1234567890")
        );

        let post = &actions(&root)[1];
        assert_eq!(
            at(post, &["WFWorkflowActionParameters", "WFHTTPMethod"]).as_string(),
            Some("POST")
        );

        let pairs: Vec<(&str, &str)> = body_items(&root)
            .iter()
            .map(|item| (text_of(at(item, &["WFKey"])), text_of(at(item, &["WFValue"]))))
            .collect();
        assert_eq!(pairs[0], ("user_id", "user & <co>"));
        assert_eq!(pairs[1], ("app_id", "line"));
        assert_eq!(pairs[2], ("event_type", "app_opened"));
        assert_eq!(pairs[3], ("timestamp", ATTACHMENT_MARKER));
    }

    #[test]
    fn timestamp_resolves_to_current_date_attachment() {
        let root = decode(&serialize(&build_document("u1", "https://x/webhook").unwrap()).unwrap());
        let timestamp = &body_items(&root)[3];

        assert_eq!(
            at(timestamp, &["WFValue", "Value", "attachmentsByRange", "{0, 1}", "Type"]).as_string(),
            Some("CurrentDate")
        );
    }

    #[test]
    fn metadata_constants_are_typed() {
        let root = decode(&serialize(&build_document("u1", "https://x/webhook").unwrap()).unwrap());

        assert_eq!(at(&root, &["WFWorkflowClientVersion"]).as_string(), Some("2302.0.4"));
        assert_eq!(at(&root, &["WFWorkflowMinimumClientVersion"]).as_unsigned_integer(), Some(900));
        assert_eq!(
            at(&root, &["WFWorkflowIcon", "WFWorkflowIconStartColor"]).as_unsigned_integer(),
            Some(431817727)
        );
        assert_eq!(
            at(&root, &["WFWorkflowIcon", "WFWorkflowIconGlyphNumber"]).as_unsigned_integer(),
            Some(59511)
        );
        assert_eq!(at(&root, &["WFWorkflowTypes"]).as_array().unwrap().len(), 2);
        assert_eq!(
            at(&root, &["WFWorkflowInputContentItemClasses"]).as_array().unwrap().len(),
            17
        );
    }
}
