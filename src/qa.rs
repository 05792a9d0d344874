//! Document Q&A through an OpenAI-compatible Chat Completions API

use crate::config::QaConfig;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer the user's question based \
     only on the provided document. If the document does not contain enough information, say so. \
     Keep answers concise.";

const META_SYSTEM_PROMPT: &str = "You are a precise assistant. Extract metadata from the document. \
     Return ONLY a valid JSON object with exactly these keys (use null if not found): \
     \"title\" (document title), \"date_time\" (document date/time as found in the text), \
     \"summary\" (exactly one short sentence summarizing the document). No other text.";

/// Characters of an unparseable metadata reply kept as the summary
const RAW_SUMMARY_CHARS: usize = 500;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4}").unwrap());
/// Anything but word characters, whitespace, and hyphens
static TITLE_JUNK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static TITLE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

// ============================================================================
// Document loading
// ============================================================================

/// Text of a JSON document: `{"pages": [{"text": ..}]}` and arrays of pages
/// are joined with blank lines, anything else is passed through as JSON.
pub fn text_from_json(value: &serde_json::Value) -> String {
    use serde_json::Value;

    let page_text = |page: &Value| -> String {
        match page {
            Value::Object(map) => match map.get("text") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    };

    match value {
        Value::Object(map) => match map.get("pages") {
            Some(Value::Array(pages)) => pages
                .iter()
                .map(page_text)
                .collect::<Vec<_>>()
                .join("\n\n")
                .trim()
                .to_string(),
            _ => value.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(page_text)
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string(),
        other => other.to_string(),
    }
}

/// Load document text from a `.txt` or `.json` (pdfextract output) file
pub fn load_document(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::SourceNotFound {
            path: path.display().to_string(),
        });
    }

    let raw = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let text = if is_json {
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        text_from_json(&value)
    } else {
        raw.trim().to_string()
    };

    if text.is_empty() {
        return Err(Error::EmptyDocument {
            path: path.display().to_string(),
        });
    }
    Ok(text)
}

// ============================================================================
// Prompts
// ============================================================================

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Prompt asking `question` about `document`
pub fn question_messages(document: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ANSWER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Document:\n\n{}\n\n---\n\nQuestion: {}",
            document, question
        )),
    ]
}

/// Prompt asking for title, date/time, and summary of the first
/// `max_chars` characters of `document`
pub fn meta_messages(document: &str, max_chars: usize) -> Vec<ChatMessage> {
    let excerpt: String = document.chars().take(max_chars).collect();
    vec![
        ChatMessage::system(META_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Document:\n\n{}\n\n---\n\nReturn the JSON object only.",
            excerpt
        )),
    ]
}

// ============================================================================
// Metadata
// ============================================================================

/// Document metadata extracted by the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub date_time: Option<String>,
    pub summary: Option<String>,
}

fn strip_code_fence(raw: &str) -> &str {
    let raw = raw.trim();
    if !raw.starts_with("```") {
        return raw;
    }
    let body = raw.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    body.rsplit_once("```")
        .map(|(inner, _)| inner)
        .unwrap_or(body)
        .trim()
}

fn meta_field(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => None,
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Some(other) => Some(other.to_string()),
    }
}

/// Parse the model's metadata reply. A reply that isn't a JSON object is
/// kept (truncated) as the summary.
pub fn parse_meta_reply(reply: &str) -> DocumentMeta {
    let raw = strip_code_fence(reply);
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => DocumentMeta {
            title: meta_field(map.get("title")),
            date_time: meta_field(map.get("date_time")),
            summary: meta_field(map.get("summary")),
        },
        _ => DocumentMeta {
            title: None,
            date_time: None,
            summary: if raw.is_empty() {
                None
            } else {
                Some(raw.chars().take(RAW_SUMMARY_CHARS).collect())
            },
        },
    }
}

fn date_part(date_time: Option<&str>, today: NaiveDate) -> String {
    let Some(s) = date_time.map(str::trim).filter(|s| !s.is_empty()) else {
        return today.format("%Y-%m-%d").to_string();
    };

    if let Some(caps) = ISO_DATE_RE.captures(s) {
        return format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]);
    }

    let head: String = s.chars().take(50).collect();
    for fmt in ["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&head, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    if let Some(m) = YEAR_RE.find(s) {
        return format!("{}-01-01", m.as_str());
    }

    today.format("%Y-%m-%d").to_string()
}

fn title_part(title: Option<&str>) -> String {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return "Untitled".to_string();
    };

    let word = TITLE_JUNK_RE.replace_all(title, "");
    let word = TITLE_SEPARATOR_RE.replace_all(&word, "-");
    let word = word.trim_matches('-');
    if word.is_empty() {
        "Untitled".to_string()
    } else {
        word.to_string()
    }
}

/// Canonical file name `YYYY-mm-dd_Document-title<extension>`
pub fn canonical_doc_filename(
    date_time: Option<&str>,
    title: Option<&str>,
    extension: &str,
    today: NaiveDate,
) -> String {
    format!(
        "{}_{}{}",
        date_part(date_time, today),
        title_part(title),
        extension
    )
}

/// [`canonical_doc_filename`] with today's local date as the fallback
pub fn canonical_doc_filename_today(meta: &DocumentMeta, extension: &str) -> String {
    canonical_doc_filename(
        meta.date_time.as_deref(),
        meta.title.as_deref(),
        extension,
        Local::now().date_naive(),
    )
}

// ============================================================================
// Completion client
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

fn map_http_error(e: reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    Error::Upstream { reason }
}

/// Client for the Chat Completions endpoint
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: url::Url,
    api_key: String,
    model: String,
}

impl CompletionClient {
    /// Build a client. Fails with `MissingCredential` when no API key is
    /// configured, before any network activity.
    pub fn new(config: &QaConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = url::Url::parse(&base)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| Error::Usage(format!("Invalid API base URL '{}': {}", config.base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(map_http_error)?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one chat request and return the assistant reply text
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::debug!("POST {} (model {})", self.endpoint, self.model);

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(Error::Upstream {
                reason: format!("API returned {}: {}", status, detail),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| Error::Upstream {
            reason: format!("Malformed API response: {}", e),
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Answer `question` from `document`
    pub async fn ask(&self, document: &str, question: &str) -> Result<String> {
        self.complete(&question_messages(document, question)).await
    }

    /// Extract title, date/time, and summary
    pub async fn extract_meta(&self, document: &str, max_chars: usize) -> Result<DocumentMeta> {
        let reply = self.complete(&meta_messages(document, max_chars)).await?;
        Ok(parse_meta_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_text_from_pages_object() {
        let value = json!({
            "source": "doc.pdf",
            "pages": [{"page": 1, "text": "One"}, {"page": 2, "text": "Two"}]
        });
        assert_eq!(text_from_json(&value), "One\n\nTwo");
    }

    #[test]
    fn test_text_from_array() {
        let value = json!([{"text": "A"}, "B", 3]);
        assert_eq!(text_from_json(&value), "A\n\nB\n\n3");
    }

    #[test]
    fn test_text_from_other_json() {
        let value = json!({"title": "Report"});
        assert_eq!(text_from_json(&value), r#"{"title":"Report"}"#);
    }

    #[test]
    fn test_load_document_txt_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("doc.txt");
        std::fs::write(&txt, "  Hello world \n").unwrap();
        assert_eq!(load_document(&txt).unwrap(), "Hello world");

        let js = dir.path().join("doc.json");
        std::fs::write(&js, r#"{"pages": [{"page": 3, "text": "Page three"}]}"#).unwrap();
        assert_eq!(load_document(&js).unwrap(), "Page three");

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "   \n").unwrap();
        assert!(matches!(
            load_document(&empty),
            Err(Error::EmptyDocument { .. })
        ));

        assert!(matches!(
            load_document(&dir.path().join("missing.txt")),
            Err(Error::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_question_prompt() {
        let messages = question_messages("The sky is blue.", "What color is the sky?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(
            messages[1].content,
            "Document:\n\nThe sky is blue.\n\n---\n\nQuestion: What color is the sky?"
        );
    }

    #[test]
    fn test_meta_prompt_truncates() {
        let doc = "x".repeat(100);
        let messages = meta_messages(&doc, 10);
        assert!(messages[1].content.contains(&"x".repeat(10)));
        assert!(!messages[1].content.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_parse_meta_reply() {
        let meta = parse_meta_reply(
            r#"{"title": "Annual Report", "date_time": "2024-03-05", "summary": null}"#,
        );
        assert_eq!(meta.title.as_deref(), Some("Annual Report"));
        assert_eq!(meta.date_time.as_deref(), Some("2024-03-05"));
        assert_eq!(meta.summary, None);
    }

    #[test]
    fn test_parse_meta_reply_code_fence() {
        let meta = parse_meta_reply("```json\n{\"title\": \"Memo\", \"summary\": \"Short.\"}\n```");
        assert_eq!(meta.title.as_deref(), Some("Memo"));
        assert_eq!(meta.summary.as_deref(), Some("Short."));
    }

    #[test]
    fn test_parse_meta_reply_not_json() {
        let meta = parse_meta_reply("I could not find any metadata.");
        assert_eq!(meta.title, None);
        assert_eq!(
            meta.summary.as_deref(),
            Some("I could not find any metadata.")
        );

        let long = "y".repeat(800);
        assert_eq!(parse_meta_reply(&long).summary.unwrap().len(), 500);
        assert_eq!(parse_meta_reply("  ").summary, None);
    }

    #[test]
    fn test_canonical_filename() {
        assert_eq!(
            canonical_doc_filename(Some("2024-3-5 10:00"), Some("Annual Report 2024"), ".json", day()),
            "2024-03-05_Annual-Report-2024.json"
        );
        assert_eq!(
            canonical_doc_filename(Some("March 5, 2024"), Some("Q&A: notes!"), ".json", day()),
            "2024-03-05_QA-notes.json"
        );
        assert_eq!(
            canonical_doc_filename(Some("05.03.2024"), None, ".json", day()),
            "2024-03-05_Untitled.json"
        );
        assert_eq!(
            canonical_doc_filename(Some("Spring 2023"), Some("  -- "), ".json", day()),
            "2023-01-01_Untitled.json"
        );
        assert_eq!(
            canonical_doc_filename(None, Some("Minutes - final"), ".txt", day()),
            "2026-10-14_Minutes-final.txt"
        );
        assert_eq!(
            canonical_doc_filename(Some("yesterday"), Some("x"), ".json", day()),
            "2026-10-14_x.json"
        );
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = QaConfig::default();
        assert!(matches!(
            CompletionClient::new(&config),
            Err(Error::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_client_endpoint() {
        let config = QaConfig {
            api_key: Some("sk-test".to_string()),
            ..QaConfig::default()
        };
        let client = CompletionClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
