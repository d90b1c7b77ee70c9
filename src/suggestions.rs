//! # Suggestion Generator
//!
//! This module produces next-day guidance for a day's totals through a Groq
//! (OpenAI-compatible) chat completion that is asked to answer in JSON:
//!
//! ```json
//! {"suggestions": ["..."], "analysis": ["..."]}
//! ```
//!
//! The generator never fails. A missing API key, a transport error, a non-success
//! status or an unreadable reply all produce [`fallback_suggestions`].

use crate::config::SuggestionConfig;
use crate::errors::ServiceError;
use crate::meal_model::{RiskLevel, Totals};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const CLINICAL_GUIDELINES: &str = "\
Clinical Guidelines for High Glycemic Management:
1. Activity: Suggest post-meal light walking (10-15 mins) to improve insulin sensitivity.
2. Hydration: Encourage water intake (250-500ml) to aid glucose excretion.
3. Food Sequencing: Recommend eating fiber/protein *before* starches/sugar.
4. Dietary Swaps: Swap high-GI foods (white rice, white bread, sugary drinks) for low-GI alternatives (quinoa, legumes, whole fruit).
5. Portion Control: Suggest reducing simple carb portion sizes by 50% in the next meal.";

const SYSTEM_PROMPT: &str =
    "You are a helpful nutrition assistant which outputs only valid JSON.";

const DEFAULT_SUGGESTION: &str = "Guidance currently unavailable. Please focus on whole foods.";
const DEFAULT_ANALYSIS: &str = "Analysis currently unavailable.";

/// Guidance for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
    pub analysis: Vec<String>,
}

/// Safe generic payload returned whenever the generator cannot answer
pub fn fallback_suggestions() -> Suggestions {
    Suggestions {
        suggestions: vec![
            "AI service is currently unavailable.".to_string(),
            "Please focus on staying hydrated.".to_string(),
            "Prioritize whole, unprocessed foods.".to_string(),
            "Monitor your portions at the next meal.".to_string(),
            "Consult a healthcare provider for specific advice.".to_string(),
        ],
        analysis: vec![
            "Automated analysis unavailable.".to_string(),
            "Please check your internet connection or API configuration.".to_string(),
            "Metrics are still being tracked.".to_string(),
        ],
    }
}

#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn suggest(&self, totals: &Totals, risk_level: RiskLevel) -> Suggestions;
}

/// Build the user prompt carrying the day's totals and the guidelines
pub fn build_prompt(totals: &Totals, risk_level: RiskLevel) -> String {
    format!(
        "You are a senior clinical nutritionist specializing in diabetes and glycemic control.

Patient Data:
- Sugar: {sugar}g
- Carbs: {carbs}g
- Fiber: {fiber}g
- Protein: {protein}g
- Fat: {fat}g
- Calculated Risk Level: {risk_level}

{CLINICAL_GUIDELINES}

Your Goal:
1. Analyze the patient's intake relative to their risk level.
2. Provide 5 personalized, specific, and actionable suggestions based strictly on the Clinical Guidelines provided above.
3. Provide 3-4 clear, scientific reasons explaining the current risk level.

Output Guidelines:
- Do NOT simply list the guidelines; apply them to the patient's specific data (e.g., \"Since your sugar was 50g, try...\").
- Be empathetic but professional.
- Return ONLY valid JSON.

JSON Format:
{{
    \"suggestions\": [\"suggestion 1\", \"suggestion 2\", \"suggestion 3\", \"suggestion 4\", \"suggestion 5\"],
    \"analysis\": [\"reason 1\", \"reason 2\", \"reason 3\", \"reason 4\"]
}}",
        sugar = totals.total_sugar,
        carbs = totals.total_carbs,
        fiber = totals.total_fiber,
        protein = totals.total_protein,
        fat = totals.total_fat,
    )
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Interpret the model's reply content
///
/// A reply with only one of the two keys gets a default for the other; a reply
/// with neither, or that is not a JSON object, is an error.
pub fn parse_suggestion_reply(content: &str) -> Result<Suggestions, ServiceError> {
    let value: Value = serde_json::from_str(content)?;
    if !value.is_object() {
        return Err(ServiceError::Payload("reply is not a JSON object".to_string()));
    }

    let suggestions = string_list(value.get("suggestions"));
    let analysis = string_list(value.get("analysis"));
    if suggestions.is_none() && analysis.is_none() {
        return Err(ServiceError::Payload(
            "reply has neither suggestions nor analysis".to_string(),
        ));
    }

    Ok(Suggestions {
        suggestions: suggestions.unwrap_or_else(|| vec![DEFAULT_SUGGESTION.to_string()]),
        analysis: analysis.unwrap_or_else(|| vec![DEFAULT_ANALYSIS.to_string()]),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Groq chat-completions client
pub struct GroqSuggestionClient {
    config: SuggestionConfig,
    http_client: reqwest::Client,
}

impl GroqSuggestionClient {
    pub fn new(config: SuggestionConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// One chat completion round trip
    pub async fn request(&self, totals: &Totals, risk_level: RiskLevel) -> Result<Suggestions, ServiceError> {
        let api_key = self
            .api_key()
            .ok_or_else(|| ServiceError::MissingCredentials("GROQ_API_KEY".to_string()))?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(totals, risk_level),
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .http_client
            .post(&self.config.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Payload("no choices in reply".to_string()))?;

        parse_suggestion_reply(&content)
    }
}

#[async_trait]
impl SuggestionGenerator for GroqSuggestionClient {
    async fn suggest(&self, totals: &Totals, risk_level: RiskLevel) -> Suggestions {
        match self.request(totals, risk_level).await {
            Ok(suggestions) => {
                info!(
                    suggestions = suggestions.suggestions.len(),
                    analysis = suggestions.analysis.len(),
                    "Generated suggestions"
                );
                suggestions
            }
            Err(e) => {
                warn!(error = %e, "Suggestion service unavailable, using fallback");
                fallback_suggestions()
            }
        }
    }
}

/// Generator that always returns the fallback payload
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackSuggestions;

#[async_trait]
impl SuggestionGenerator for FallbackSuggestions {
    async fn suggest(&self, _totals: &Totals, _risk_level: RiskLevel) -> Suggestions {
        fallback_suggestions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let fallback = fallback_suggestions();
        assert_eq!(fallback.suggestions.len(), 5);
        assert_eq!(fallback.analysis.len(), 3);
        assert_eq!(fallback.suggestions[0], "AI service is currently unavailable.");
    }

    #[test]
    fn test_parse_complete_reply() {
        let reply = r#"{"suggestions": ["Walk 15 minutes"], "analysis": ["Sugar is high", "Fiber is low"]}"#;
        let parsed = parse_suggestion_reply(reply).unwrap();
        assert_eq!(parsed.suggestions, vec!["Walk 15 minutes".to_string()]);
        assert_eq!(parsed.analysis.len(), 2);
    }

    #[test]
    fn test_parse_partial_reply_defaults_missing_key() {
        let parsed = parse_suggestion_reply(r#"{"suggestions": ["Drink water"]}"#).unwrap();
        assert_eq!(parsed.analysis, vec!["Analysis currently unavailable.".to_string()]);

        let parsed = parse_suggestion_reply(r#"{"analysis": ["Carbs are moderate"]}"#).unwrap();
        assert_eq!(
            parsed.suggestions,
            vec!["Guidance currently unavailable. Please focus on whole foods.".to_string()]
        );
    }

    #[test]
    fn test_parse_bad_reply() {
        assert!(parse_suggestion_reply("not json").is_err());
        assert!(parse_suggestion_reply("[1, 2]").is_err());
        assert!(parse_suggestion_reply(r#"{"advice": []}"#).is_err());
    }

    #[test]
    fn test_prompt_carries_totals_and_risk() {
        let totals = Totals {
            total_sugar: 52.3,
            total_carbs: 180.0,
            ..Default::default()
        };
        let prompt = build_prompt(&totals, RiskLevel::Moderate);
        assert!(prompt.contains("- Sugar: 52.3g"));
        assert!(prompt.contains("- Carbs: 180g"));
        assert!(prompt.contains("- Calculated Risk Level: Moderate"));
        assert!(prompt.contains("Portion Control"));
        assert!(prompt.contains("\"suggestions\": [\"suggestion 1\""));
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_without_request() {
        let client = GroqSuggestionClient::new(SuggestionConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/chat".to_string(),
            ..SuggestionConfig::default()
        })
        .unwrap();
        let result = client.suggest(&Totals::default(), RiskLevel::Safe).await;
        assert_eq!(result, fallback_suggestions());
    }
}
