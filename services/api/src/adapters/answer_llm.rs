//! services/api/src/adapters/answer_llm.rs
//!
//! This module contains the adapter for the answer-generation LLM. It
//! implements the `AnswerProvider` port from the `core` crate and owns the
//! normalization of provider replies: strict JSON first, regex scraping
//! for replies that came back as prose.

const SYSTEM_INSTRUCTIONS: &str = r#"You are a medical education tutor answering questions for a medical student.

You will be told the student's syllabus (curriculum context), the subject the question belongs to, and how the answer should be framed.

Always ground your answer in standard medical textbooks for that syllabus.

Respond with a single JSON object, and nothing else, using exactly these keys:
{
  "answer": "the full answer text",
  "references": [{"source": "textbook name", "chapter": "chapter", "page": "page"}],
  "citations": ["full citation strings"],
  "key_points": ["short high-yield points"],
  "clinical_relevance": "one short paragraph connecting the answer to clinical practice"
}

Rules:
- "references" lists the textbooks a student of this syllabus would actually read; chapter and page may be null when unknown.
- "key_points" has 3 to 6 entries, each a single sentence.
- Do not wrap the JSON in markdown fences.
- Do not add keys beyond the five listed."#;

const USER_INPUT_TEMPLATE: &str = r#"SYLLABUS: {syllabus}
SUBJECT: {subject}
FRAMING: {framing}

QUESTION:
{question}"#;

const EXAM_FRAMING: &str =
    "Rapid exam revision: high-yield facts, mnemonics where they exist, one-line takeaways.";
const CONCEPTUAL_FRAMING: &str =
    "Deep conceptual understanding: mechanisms first, then the clinical consequences.";

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::responses::CreateResponseArgs, Client,
};
use async_trait::async_trait;
use medprep_core::domain::{ProviderAnswer, Reference, StudyMode};
use medprep_core::ports::{AnswerProvider, PortError, PortResult};
use regex::Regex;
use serde::Deserialize;

//=========================================================================================
// Provider Reply Handling
//=========================================================================================

/// What came back from the provider, before normalization.
///
/// Extraction heuristics only ever run on the `Unstructured` variant; a
/// reply that parsed as JSON is taken at face value.
#[derive(Debug)]
pub enum ProviderReply {
    Structured(StructuredReply),
    Unstructured(String),
}

/// The JSON shape the prompt asks for. Field aliases absorb the camelCase
/// the model sometimes produces anyway.
#[derive(Debug, Deserialize)]
pub struct StructuredReply {
    pub answer: String,
    #[serde(default)]
    pub references: Vec<ReplyReference>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default, alias = "keyPoints")]
    pub key_points: Vec<String>,
    #[serde(default, alias = "clinicalRelevance")]
    pub clinical_relevance: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyReference {
    #[serde(alias = "book", alias = "title")]
    pub source: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Classifies a raw reply. Markdown fences around an otherwise-valid JSON
/// body are tolerated.
pub fn parse_reply(raw: &str) -> ProviderReply {
    let trimmed = strip_fences(raw.trim());
    match serde_json::from_str::<StructuredReply>(trimmed) {
        Ok(reply) => ProviderReply::Structured(reply),
        Err(_) => ProviderReply::Unstructured(raw.trim().to_string()),
    }
}

/// Normalizes either variant into the structured answer shape.
pub fn normalize_reply(reply: ProviderReply) -> ProviderAnswer {
    match reply {
        ProviderReply::Structured(r) => ProviderAnswer {
            answer: r.answer,
            references: r
                .references
                .into_iter()
                .map(|r| Reference {
                    source: r.source,
                    chapter: r.chapter,
                    page: r.page,
                })
                .collect(),
            citations: r.citations,
            key_points: r.key_points,
            clinical_relevance: r.clinical_relevance,
        },
        ProviderReply::Unstructured(text) => ProviderAnswer {
            references: extract_references(&text),
            citations: extract_citations(&text),
            key_points: extract_key_points(&text),
            clinical_relevance: extract_clinical_relevance(&text),
            answer: text,
        },
    }
}

fn strip_fences(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn extract_references(text: &str) -> Vec<Reference> {
    let line_re = Regex::new(r"(?im)^\s*(?:references?|sources?)\s*[:\-]\s*(.+)$").unwrap();
    let chapter_re = Regex::new(r"(?i)chapter\s+([A-Za-z0-9\-]+)").unwrap();
    let page_re = Regex::new(r"(?i)(?:page|pg\.?)\s*([0-9]+(?:\s*-\s*[0-9]+)?)").unwrap();

    line_re
        .captures_iter(text)
        .map(|caps| {
            let line = caps[1].trim().to_string();
            let chapter = chapter_re.captures(&line).map(|c| c[1].to_string());
            let page = page_re.captures(&line).map(|c| c[1].to_string());
            let source = line
                .split(',')
                .next()
                .unwrap_or(line.as_str())
                .trim()
                .to_string();
            Reference {
                source,
                chapter,
                page,
            }
        })
        .collect()
}

fn extract_citations(text: &str) -> Vec<String> {
    let re = Regex::new(r"(?m)^\s*\[\d+\]\s*(.+)$").unwrap();
    re.captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

fn extract_key_points(text: &str) -> Vec<String> {
    let re = Regex::new(r"(?m)^\s*(?:[-•*]|\d+[.)])\s+(.+)$").unwrap();
    re.captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

fn extract_clinical_relevance(text: &str) -> String {
    let re =
        Regex::new(r"(?is)clinical\s+(?:relevance|correlation)\s*[:\-]?\s*(.+?)(?:\n\s*\n|$)")
            .unwrap();
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnswerProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAnswerAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAnswerAdapter {
    /// Creates a new `OpenAiAnswerAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `AnswerProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnswerProvider for OpenAiAnswerAdapter {
    async fn generate_answer(
        &self,
        question: &str,
        syllabus: &str,
        subject: &str,
        mode: StudyMode,
    ) -> PortResult<ProviderAnswer> {
        let framing = match mode {
            StudyMode::Exam => EXAM_FRAMING,
            StudyMode::Conceptual => CONCEPTUAL_FRAMING,
        };
        let user_input = USER_INPUT_TEMPLATE
            .replace("{syllabus}", syllabus)
            .replace("{subject}", subject)
            .replace("{framing}", framing)
            .replace("{question}", question);

        let request = CreateResponseArgs::default()
            .model(&self.model)
            .instructions(SYSTEM_INSTRUCTIONS)
            .input(user_input)
            .max_output_tokens(1500u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let raw = response.output_text().unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(PortError::Unexpected(
                "provider returned an empty reply".to_string(),
            ));
        }

        Ok(normalize_reply(parse_reply(&raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_reply_is_structured() {
        let raw = r#"{"answer": "The femur is the thigh bone.",
            "references": [{"source": "Gray's Anatomy", "chapter": "6", "page": "120"}],
            "citations": ["Gray's Anatomy, 42nd ed."],
            "key_points": ["Longest bone in the body"],
            "clinical_relevance": "Neck fractures are common in the elderly."}"#;
        let answer = normalize_reply(parse_reply(raw));
        assert_eq!(answer.answer, "The femur is the thigh bone.");
        assert_eq!(answer.references.len(), 1);
        assert_eq!(answer.references[0].chapter.as_deref(), Some("6"));
        assert_eq!(answer.key_points, vec!["Longest bone in the body"]);
    }

    #[test]
    fn fenced_json_is_still_structured() {
        let raw = "```json\n{\"answer\": \"ok\"}\n```";
        match parse_reply(raw) {
            ProviderReply::Structured(r) => assert_eq!(r.answer, "ok"),
            ProviderReply::Unstructured(_) => panic!("fenced JSON should parse"),
        }
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let raw = r#"{"answer": "ok", "keyPoints": ["a"], "clinicalRelevance": "b"}"#;
        let answer = normalize_reply(parse_reply(raw));
        assert_eq!(answer.key_points, vec!["a"]);
        assert_eq!(answer.clinical_relevance, "b");
    }

    #[test]
    fn prose_reply_falls_back_to_extraction() {
        let raw = "\
The femoral neck is the weak point of the hip.

- Blood supply runs retrograde along the neck
- Displaced fractures risk avascular necrosis

Reference: Gray's Anatomy, Chapter 80, Page 1362
[1] Gray's Anatomy, 42nd edition

Clinical relevance: suspect a neck fracture in any elderly fall with a shortened, externally rotated leg.";

        let answer = normalize_reply(parse_reply(raw));
        assert!(answer.answer.starts_with("The femoral neck"));
        assert_eq!(answer.references.len(), 1);
        assert_eq!(answer.references[0].source, "Gray's Anatomy");
        assert_eq!(answer.references[0].chapter.as_deref(), Some("80"));
        assert_eq!(answer.references[0].page.as_deref(), Some("1362"));
        assert_eq!(answer.citations, vec!["Gray's Anatomy, 42nd edition"]);
        assert_eq!(answer.key_points.len(), 2);
        assert!(answer
            .clinical_relevance
            .starts_with("suspect a neck fracture"));
    }

    #[test]
    fn prose_without_sections_extracts_nothing() {
        let raw = "Plain prose with no list, reference or clinical section.";
        let answer = normalize_reply(parse_reply(raw));
        assert!(answer.references.is_empty());
        assert!(answer.citations.is_empty());
        assert!(answer.key_points.is_empty());
        assert!(answer.clinical_relevance.is_empty());
    }
}
