//! Completion notices over a transactional email HTTP API.

use async_trait::async_trait;
use minijinja::Environment;
use proofing_core::config::EmailApiConfig;
use proofing_core::error::{ProofingError, Result};
use proofing_core::notification::{CompletionNotice, NotificationDispatcher};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const SUBJECT_TEMPLATE: &str = "Photo selection completed for project {{ project_id }}";

const BODY_TEMPLATE: &str = r#"The client completed their photo selection.

Project:   {{ project_id }}
Session:   {{ session_id }}
Selected:  {{ selected_count }} of {{ total_limit }}
{%- for extra in extras %}
{{ extra.label }}: {{ extra.count }}
{%- endfor %}
{%- if commented_photos %}

Photos with comments:
{%- for id in commented_photos %}
  - {{ id }}
{%- endfor %}
{%- endif %}

Completed at {{ completed_at }}.
"#;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

/// Sends completion notices to the studio address.
pub struct HttpEmailDispatcher {
    client: Client,
    config: EmailApiConfig,
    templates: Environment<'static>,
}

impl HttpEmailDispatcher {
    pub fn new(config: EmailApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ProofingError::notification(format!("Failed to create HTTP client: {}", e)))?;

        let mut templates = Environment::new();
        templates
            .add_template("subject", SUBJECT_TEMPLATE)
            .map_err(|e| ProofingError::internal(format!("Invalid subject template: {}", e)))?;
        templates
            .add_template("body", BODY_TEMPLATE)
            .map_err(|e| ProofingError::internal(format!("Invalid body template: {}", e)))?;

        Ok(Self {
            client,
            config,
            templates,
        })
    }

    /// Renders the subject and body of a notice.
    pub fn render(&self, notice: &CompletionNotice) -> Result<(String, String)> {
        let render = |name: &str| -> Result<String> {
            self.templates
                .get_template(name)
                .and_then(|t| t.render(notice))
                .map_err(|e| ProofingError::internal(format!("Failed to render {}: {}", name, e)))
        };
        Ok((render("subject")?, render("body")?))
    }
}

#[async_trait]
impl NotificationDispatcher for HttpEmailDispatcher {
    async fn send_completion(&self, notice: &CompletionNotice) -> Result<()> {
        if !self.config.is_configured() {
            return Err(ProofingError::notification(
                "Email API is not configured (api_base_url and studio_address are required)",
            ));
        }

        let (subject, text) = self.render(notice)?;
        let payload = SendEmailRequest {
            from: &self.config.from_address,
            to: &self.config.studio_address,
            subject,
            text,
        };

        let url = format!("{}/send", self.config.api_base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProofingError::notification(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProofingError::notification(format!(
                "Email API returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!(session_id = %notice.session_id, "Completion notice sent");
        Ok(())
    }
}
