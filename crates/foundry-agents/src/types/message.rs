use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentThread {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ThreadMessage {
    /// Text of the last text part, the message's final rendering
    pub fn text_value(&self) -> Option<&str> {
        self.content.iter().rev().find_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }

    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.content.iter().flat_map(|part| match part {
            MessageContent::Text { text } => text.annotations.as_slice(),
            MessageContent::Other => &[],
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Citation attached to a span of message text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    FileCitation {
        #[serde(default)]
        text: String,
        file_citation: FileCitation,
    },
    UrlCitation {
        #[serde(default)]
        text: String,
        url_citation: UrlCitation,
    },
    #[serde(other)]
    Other,
}

impl Annotation {
    /// Short label for display: file id or page title
    pub fn label(&self) -> Option<&str> {
        match self {
            Annotation::FileCitation { file_citation, .. } => Some(file_citation.file_id.as_str()),
            Annotation::UrlCitation { url_citation, .. } => {
                url_citation.title.as_deref().or(Some(url_citation.url.as_str()))
            }
            Annotation::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCitation {
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlCitation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
