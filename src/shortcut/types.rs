/// Shortcut document model
///
/// Typed, immutable representation of the automation document handed to the
/// Shortcuts app. Values are only constructed by the builder; the serializer
/// maps them onto property-list nodes.

use uuid::Uuid;

/// A value resolved by the Shortcuts app when the automation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePlaceholder {
    /// Date and time of execution
    CurrentDate,
}

impl RuntimePlaceholder {
    /// Attachment type name understood by the Shortcuts app
    pub fn attachment_type(&self) -> &'static str {
        match self {
            RuntimePlaceholder::CurrentDate => "CurrentDate",
        }
    }
}

/// Value of a JSON body field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Literal(String),
    Placeholder(RuntimePlaceholder),
}

/// One key/value pair of the callback's JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadField {
    pub key: String,
    pub value: FieldValue,
}

impl PayloadField {
    pub fn literal(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: FieldValue::Literal(value.to_string()),
        }
    }

    pub fn placeholder(key: &str, placeholder: RuntimePlaceholder) -> Self {
        Self {
            key: key.to_string(),
            value: FieldValue::Placeholder(placeholder),
        }
    }
}

/// Kind of a workflow action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Resolve a URL ("URL" action)
    FetchUrl,
    /// Send an HTTP request with a JSON body ("Get Contents of URL" action)
    PostJson,
}

impl ActionKind {
    /// Action identifier understood by the Shortcuts app
    pub fn identifier(&self) -> &'static str {
        match self {
            ActionKind::FetchUrl => "is.workflow.actions.geturl",
            ActionKind::PostJson => "is.workflow.actions.downloadurl",
        }
    }
}

/// Value of an action parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Text(String),
    /// Ordered JSON body fields
    JsonBody(Vec<PayloadField>),
}

/// A single action of the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionStep {
    pub(crate) kind: ActionKind,
    pub(crate) parameters: Vec<(&'static str, ParameterValue)>,
    pub(crate) correlation_token: Uuid,
}

impl ActionStep {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Parameters in emission order
    pub fn parameters(&self) -> &[(&'static str, ParameterValue)] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Token the Shortcuts app uses to tell actions apart
    pub fn correlation_token(&self) -> Uuid {
        self.correlation_token
    }
}

/// Workflow icon descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDescriptor {
    /// Packed RGBA start color
    pub start_color: u64,
    pub glyph_number: u64,
}

/// Document-level constants the Shortcuts app validates on import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub client_version: &'static str,
    pub client_release: &'static str,
    pub minimum_client_version: u64,
    pub minimum_client_release: &'static str,
    pub icon: IconDescriptor,
    pub workflow_types: &'static [&'static str],
    pub input_content_classes: &'static [&'static str],
}

/// Complete automation document: a fetch step followed by a post step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDocument {
    pub(crate) fetch: ActionStep,
    pub(crate) post: ActionStep,
    pub(crate) metadata: &'static DocumentMetadata,
}

impl WorkflowDocument {
    /// Both steps, in execution order
    pub fn steps(&self) -> [&ActionStep; 2] {
        [&self.fetch, &self.post]
    }

    pub fn fetch_step(&self) -> &ActionStep {
        &self.fetch
    }

    pub fn post_step(&self) -> &ActionStep {
        &self.post
    }

    pub fn metadata(&self) -> &'static DocumentMetadata {
        self.metadata
    }
}
