//! Chat assistant - one question, one answer, grounded in the user's figures.
//!
//! The backend is hidden behind [`TextGenerator`] so the turn logic can run
//! against [`MockTextGenerator`] in tests and [`HttpTextGenerator`] in the
//! binary.

use crate::{
    config::settings::AssistantSettings,
    core::{
        analytics::{self, Dimension, RegistroFilter},
        registro,
        report::{format_clp, format_kpis, format_percent},
        session::Session,
    },
    entities::registro::Model as RegistroModel,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::{sync::Mutex, time::Duration};
use tracing::{debug, instrument};

/// Fixed instructions sent with every turn.
pub const SYSTEM_PROMPT: &str = "Eres el asistente de Eventario, un sistema de \
inventario y facturación de eventos. Respondes en español, de forma breve y \
concreta. Usa solo los datos de contexto entregados; si la respuesta no está en \
ellos, dilo. Los montos están en pesos chilenos.";

/// Env var holding the backend API key.
pub const API_KEY_ENV: &str = "ASSISTANT_API_KEY";

/// How many groups per dimension go into the context.
const CONTEXT_TOP_N: usize = 5;

/// A backend that completes one chat turn.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the assistant's reply to `user_message` under `system_prompt`.
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions client.
pub struct HttpTextGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl HttpTextGenerator {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(settings: &AssistantSettings, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Like [`HttpTextGenerator::new`], with the key read from `ASSISTANT_API_KEY`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the variable is unset or blank.
    pub fn from_env(settings: &AssistantSettings) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: format!("{API_KEY_ENV} is not set"),
            })?;
        Self::new(settings, api_key)
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        debug!(
            model = %self.model,
            prompt_len = user_message.len(),
            "Sending request to assistant backend"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assistant {
                message: format!("backend returned {status}: {body}"),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Assistant {
                message: "backend returned no choices".to_string(),
            })
    }
}

/// Canned backend that records what it was asked.
pub struct MockTextGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockTextGenerator {
    /// Answers every turn with `reply`.
    #[must_use]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every turn with an [`Error::Assistant`] carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(system_prompt, user_message)` pairs received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system_prompt.to_string(), user_message.to_string()));
        }
        self.reply.clone().map_err(|message| Error::Assistant { message })
    }
}

fn top_groups(registros: &[RegistroModel], dimension: Dimension) -> String {
    let groups = analytics::group_by(registros, dimension);
    if groups.is_empty() {
        return "-".to_string();
    }
    groups
        .iter()
        .take(CONTEXT_TOP_N)
        .map(|g| {
            format!(
                "{} {} ({})",
                g.label,
                format_clp(g.total),
                format_percent(g.share)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Compact summary of the user's data prefixed to every question.
#[must_use]
pub fn build_context(registros: &[RegistroModel]) -> String {
    let kpis = analytics::kpis(registros);
    let mut lines = vec!["Contexto de datos:".to_string()];
    lines.extend(format_kpis(&kpis));
    lines.push(format!("Top salones: {}", top_groups(registros, Dimension::Salon)));
    lines.push(format!("Top clientes: {}", top_groups(registros, Dimension::Compania)));
    lines.push(format!("Por tipo: {}", top_groups(registros, Dimension::Tipo)));
    if let (Some(first), Some(last)) = (
        registros.iter().map(|r| r.fecha).min(),
        registros.iter().map(|r| r.fecha).max(),
    ) {
        lines.push(format!("Periodo: {first} a {last}"));
    }
    lines.join("\n")
}

/// Runs one chat turn for the session user.
///
/// # Errors
/// Returns an error if `question` is blank, the store read fails, or the
/// backend fails or answers with nothing.
#[instrument(skip(db, session, generator), fields(user_id = %session.user_id))]
pub async fn ask(
    db: &DatabaseConnection,
    session: &Session,
    generator: &dyn TextGenerator,
    question: &str,
) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::Validation {
            field: "pregunta",
            message: "cannot be empty".to_string(),
        });
    }

    let registros = registro::list_registros(db, session, &RegistroFilter::default()).await?;
    let user_message = format!("{}\n\nPregunta: {question}", build_context(&registros));

    let answer = generator.generate(SYSTEM_PROMPT, &user_message).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(Error::Assistant {
            message: "empty reply".to_string(),
        });
    }
    Ok(answer.to_string())
}
