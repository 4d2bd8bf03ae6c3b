//! AI helpers for single assets and inventory questions

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::enrichment::{EnrichmentClient, RawText, ServiceFailure};
use crate::{
    error::{AppError, AppResult},
    models::{Asset, EnrichmentResult},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Clone)]
pub struct AssistantService {
    client: Option<EnrichmentClient>,
}

impl AssistantService {
    pub fn new(client: Option<EnrichmentClient>) -> Self {
        Self { client }
    }

    fn client(&self) -> AppResult<&EnrichmentClient> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("AI service is not configured".to_string()))
    }

    /// Category, description and care note for a new asset
    pub async fn suggest_details(&self, name: &str) -> AppResult<EnrichmentResult> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Please enter an Asset Name first.".to_string(),
            ));
        }
        let client = self.client()?;

        let prompt = format!(
            "Generate a JSON object for an asset named \"{}\".\n\
             Fields required:\n\
             - \"category\" (e.g., Laptop, Tool, Vehicle)\n\
             - \"description\" (1 concise sentence technical summary)\n\
             - \"maintenance\" (1 short sentence on how to care for it)\n\
             Return only valid JSON.",
            name
        );

        let value = client
            .complete(&prompt, None, true)
            .await?
            .into_structured()
            .map_err(|RawText(text)| {
                ServiceFailure::invalid_reply(format!("Suggestion is not valid JSON: {}", text))
            })?;

        EnrichmentResult::from_value(&value)
            .ok_or_else(|| ServiceFailure::invalid_reply("Suggestion is not a JSON object").into())
    }

    /// Free-text answer grounded in `inventory`
    pub async fn ask(&self, question: &str, inventory: &[Asset]) -> AppResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question cannot be empty".to_string()));
        }
        let client = self.client()?;

        let system = format!(
            "You are an intelligent inventory assistant. You have access to the following asset data: {}. \
             Answer the user's question accurately based strictly on this data. If the answer isn't in the \
             data, say so. Keep answers concise.",
            inventory_snapshot(inventory)
        );

        let answer = client.complete(question, Some(&system), false).await?.into_text();
        tracing::debug!(question_len = question.len(), answer_len = answer.len(), "Assistant answered");
        Ok(answer)
    }
}

/// Reduced view of the inventory sent along with a question
fn inventory_snapshot(inventory: &[Asset]) -> serde_json::Value {
    inventory
        .iter()
        .map(|asset| {
            let status = if asset.condition.is_broken() {
                "Broken/Unavailable"
            } else {
                asset.status.as_str()
            };
            json!({
                "id": asset.id,
                "name": asset.name,
                "status": status,
                "assignedTo": asset.assigned_to,
                "category": asset.category.as_deref().filter(|c| !c.is_empty()).unwrap_or("Uncategorized"),
                "manualUrl": if asset.manual_link.is_some() { "Available" } else { "None" },
            })
        })
        .collect()
}
