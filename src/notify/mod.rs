pub mod discord;
pub mod embed;

use serde::Serialize;

/// Cosmetic settings for the rendered message.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub username: String,
    pub embed_title: String,
    pub server_name: String,
    /// RGB as a single integer, the way Discord expects it.
    pub embed_color: u32,
    pub max_title_len: usize,
}

/// The webhook request body: a display username plus one embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}
