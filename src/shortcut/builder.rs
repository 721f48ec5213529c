/// Shortcut document builder
///
/// Turns a user id and webhook URL into the two-step LINE automation document:
/// a URL action carrying the webhook, followed by a JSON POST reporting that
/// the app was opened. Everything else in the document is constant.

use crate::catalog::LINE_APP_ID;
use crate::error::ShortcutError;
use crate::shortcut::types::{
    ActionKind, ActionStep, DocumentMetadata, IconDescriptor, ParameterValue, PayloadField,
    RuntimePlaceholder, WorkflowDocument,
};
use uuid::{uuid, Uuid};

/// Event reported by the callback
pub const APP_OPENED_EVENT: &str = "app_opened";

/// Correlation token of the URL action
pub const FETCH_STEP_TOKEN: Uuid = uuid!("A1B2C3D4-E5F6-7890-ABCD-EF1234567890");

/// Correlation token of the POST action
pub const POST_STEP_TOKEN: Uuid = uuid!("B2C3D4E5-F6A7-8901-BCDE-F12345678901");

/// Metadata the Shortcuts app checks when importing the document
pub static LINE_DOCUMENT_METADATA: DocumentMetadata = DocumentMetadata {
    client_version: "2302.0.4",
    client_release: "2.2",
    minimum_client_version: 900,
    minimum_client_release: "2.2",
    icon: IconDescriptor {
        start_color: 431817727,
        glyph_number: 59511,
    },
    workflow_types: &["NCWidget", "Watch"],
    input_content_classes: &[
        "WFAppStoreAppContentItem",
        "WFArticleContentItem",
        "WFContactContentItem",
        "WFDateContentItem",
        "WFEmailAddressContentItem",
        "WFGenericFileContentItem",
        "WFImageContentItem",
        "WFiTunesProductContentItem",
        "WFLocationContentItem",
        "WFDCMapsLinkContentItem",
        "WFAVAssetContentItem",
        "WFPDFContentItem",
        "WFPhoneNumberContentItem",
        "WFRichTextContentItem",
        "WFSafariWebPageContentItem",
        "WFStringContentItem",
        "WFURLContentItem",
    ],
};

/// Build the LINE "app opened" automation document
///
/// `webhook_url` is embedded verbatim; only emptiness is checked. Inputs made
/// only of whitespace count as empty, matching the request-field check.
pub fn build_document(user_id: &str, webhook_url: &str) -> Result<WorkflowDocument, ShortcutError> {
    if user_id.trim().is_empty() {
        return Err(ShortcutError::EmptyField("user_id"));
    }
    if webhook_url.trim().is_empty() {
        return Err(ShortcutError::EmptyField("webhook_url"));
    }

    let fetch = ActionStep {
        kind: ActionKind::FetchUrl,
        parameters: vec![("WFURLActionURL", ParameterValue::Text(webhook_url.to_string()))],
        correlation_token: FETCH_STEP_TOKEN,
    };

    let post = ActionStep {
        kind: ActionKind::PostJson,
        parameters: vec![
            ("WFHTTPMethod", ParameterValue::Text("POST".to_string())),
            ("WFHTTPBodyType", ParameterValue::Text("JSON".to_string())),
            ("WFJSONValues", ParameterValue::JsonBody(event_fields(user_id))),
        ],
        correlation_token: POST_STEP_TOKEN,
    };

    tracing::debug!("🧩 Built {} shortcut document for user {}", LINE_APP_ID, user_id);

    Ok(WorkflowDocument {
        fetch,
        post,
        metadata: &LINE_DOCUMENT_METADATA,
    })
}

fn event_fields(user_id: &str) -> Vec<PayloadField> {
    vec![
        PayloadField::literal("user_id", user_id),
        PayloadField::literal("app_id", LINE_APP_ID),
        PayloadField::literal("event_type", APP_OPENED_EVENT),
        PayloadField::placeholder("timestamp", RuntimePlaceholder::CurrentDate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::types::FieldValue;

    #[test]
    fn fetch_step_carries_webhook_verbatim() {
        let doc = build_document("u1", "not even a url").unwrap();
        let fetch = doc.fetch_step();

        assert_eq!(fetch.kind(), ActionKind::FetchUrl);
        assert_eq!(
            fetch.parameter("WFURLActionURL"),
            Some(&ParameterValue::Text("not even a url".to_string()))
        );
    }

    #[test]
    fn post_step_reports_app_opened() {
        let doc = build_document("u1", "https://x/webhook").unwrap();
        let post = doc.post_step();

        assert_eq!(post.kind(), ActionKind::PostJson);
        let Some(ParameterValue::JsonBody(fields)) = post.parameter("WFJSONValues") else {
            panic!("post step has no JSON body");
        };
        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["user_id", "app_id", "event_type", "timestamp"]);
        assert_eq!(fields[0].value, FieldValue::Literal("u1".to_string()));
        assert_eq!(fields[1].value, FieldValue::Literal("line".to_string()));
        assert_eq!(fields[2].value, FieldValue::Literal("app_opened".to_string()));
        assert_eq!(fields[3].value, FieldValue::Placeholder(RuntimePlaceholder::CurrentDate));
    }

    #[test]
    fn steps_are_ordered_with_distinct_tokens() {
        let doc = build_document("u1", "https://x/webhook").unwrap();
        let [first, second] = doc.steps();

        assert_eq!(first.kind(), ActionKind::FetchUrl);
        assert_eq!(second.kind(), ActionKind::PostJson);
        assert_ne!(first.correlation_token(), second.correlation_token());
        assert_eq!(doc.metadata().minimum_client_version, 900);
    }

    #[test]
    fn empty_inputs_fail_before_construction() {
        assert!(matches!(
            build_document("", "https://x/webhook"),
            Err(ShortcutError::EmptyField("user_id"))
        ));
        assert!(matches!(
            build_document("u1", "   "),
            Err(ShortcutError::EmptyField("webhook_url"))
        ));
    }
}
