//! Generative-language API client.
//!
//! Implements the text-understanding collaborator against a Gemini-style
//! `generateContent` endpoint. One attempt per call, 30 second timeout, no
//! internal retries. Authentication is an API key read from the environment
//! by the configuration layer; the client never looks it up itself.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::interpreter::{IntentExtractor, IntentParseError, Vocabulary};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error {0}: {1}")]
    Api(u16, String),
    #[error("reply carries no text")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeminiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Single completion call; returns the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, "querying generative-language API");

        let response = self
            .http
            .post(&url)
            .json(&GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part {
                        text: prompt.to_string(),
                    }],
                }],
            })
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api(status.as_u16(), body));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;
        reply
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .map(|part| part.text)
            .find(|text| !text.is_empty())
            .ok_or(GeminiError::EmptyReply)
    }

    /// Extraction prompt: the user text plus a grounding sample of known
    /// venues and artists, asking for the JSON shape the interpreter
    /// decodes.
    pub fn extraction_prompt(text: &str, vocabulary: &Vocabulary) -> String {
        let mut prompt = String::from(
            "Extract structured query parameters from this user query about \
             concert schedules.\n\n",
        );
        prompt.push_str(&format!("User query: \"{text}\"\n\n"));

        if let Some((start, end)) = vocabulary.date_range {
            prompt.push_str(&format!(
                "The schedule covers {start} to {end} ({} concerts).\n",
                vocabulary.total_concerts
            ));
        }
        if !vocabulary.venues.is_empty() {
            prompt.push_str(&format!(
                "Known venues: {}.\n",
                vocabulary.venues.join(", ")
            ));
        }
        if !vocabulary.artists.is_empty() {
            prompt.push_str(&format!(
                "Known artists: {}.\n",
                vocabulary.artists.join(", ")
            ));
        }

        prompt.push_str(
            "\nRespond with JSON only, keys: date, date_range, artist, venue, \
             location, time_of_day, ticketed, intent, is_followup.\n\
             Use null for anything the query does not mention. date_range is \
             [start, end] or null. time_of_day is one of morning, afternoon, \
             evening, night. ticketed is Free or Ticketed. intent is one of \
             search, route_planning, info, help. is_followup is true when the \
             query refines earlier results (\"only\", \"those\", \"them\").\n\n\
             Example:\n\
             {\"date\": \"2025-12-15\", \"date_range\": null, \"artist\": \
             \"T.M. Krishna\", \"venue\": null, \"location\": null, \
             \"time_of_day\": \"evening\", \"ticketed\": null, \"intent\": \
             \"search\", \"is_followup\": false}\n",
        );
        prompt
    }
}

#[async_trait]
impl IntentExtractor for GeminiClient {
    async fn extract(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
    ) -> Result<String, IntentParseError> {
        self.generate(&Self::extraction_prompt(text, vocabulary))
            .await
            .map_err(|err| IntentParseError::Service(err.to_string()))
    }
}
