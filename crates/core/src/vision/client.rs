//! OpenAI-compatible vision client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kvitto_shared::config::VisionSettings;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use super::VisionError;
use super::types::{ExtractedReceipt, parse_extraction};

/// Content types the analyzer will send to the model.
const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You extract fields from receipt images. \
Respond with ONLY a JSON object with the keys merchant (string), \
transaction_date (string, YYYY-MM-DD), amount (number, the tax-inclusive total), \
tax (number, only if printed on the receipt), category (string) and \
notes (string, a short plain-text line-item breakdown). \
Use null for any field you cannot read. Do not wrap the JSON in markdown.";

/// Sends receipt images to a vision-capable chat-completions endpoint and
/// parses the answer into an [`ExtractedReceipt`] draft.
#[derive(Debug, Clone)]
pub struct ReceiptAnalyzer {
    client: Client,
    settings: VisionSettings,
}

impl ReceiptAnalyzer {
    /// Creates an analyzer from runtime settings.
    #[must_use]
    pub fn new(settings: VisionSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Analyzes one receipt image and returns the extracted field draft.
    pub async fn analyze(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> Result<ExtractedReceipt, VisionError> {
        if !SUPPORTED_IMAGE_TYPES.contains(&content_type) {
            return Err(VisionError::UnsupportedContentType(content_type.to_string()));
        }

        let data_url = format!("data:{content_type};base64,{}", STANDARD.encode(image));
        let payload = json!({
            "model": self.settings.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "Extract the fields from this receipt." },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| VisionError::MissingContent(body.to_string()))?;

        parse_extraction(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_image_content_types() {
        let analyzer = ReceiptAnalyzer::new(VisionSettings {
            endpoint: "http://localhost/v1/chat/completions".to_string(),
            api_key: "test".to_string(),
            model: "test-model".to_string(),
        });

        let result = analyzer.analyze(b"%PDF-1.4", "application/pdf").await;
        assert!(matches!(
            result,
            Err(VisionError::UnsupportedContentType(t)) if t == "application/pdf"
        ));
    }
}
