//! Model presets for the supported OpenAI-compatible services.

use crate::error::LlmError;
use std::fmt;
use std::str::FromStr;

/// A chat model with a known endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmModel {
    /// `DeepSeek` V3 chat model
    DeepSeekChat,
    /// Moonshot Kimi K2
    KimiK2,
}

impl LlmModel {
    /// Every supported preset.
    pub const ALL: [Self; 2] = [Self::DeepSeekChat, Self::KimiK2];

    /// Model name sent in the request body.
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            Self::DeepSeekChat => "deepseek-chat",
            Self::KimiK2 => "kimi-k2-0711-preview",
        }
    }

    /// Provider identifier used in logs and errors.
    #[must_use]
    pub fn provider_id(self) -> &'static str {
        match self {
            Self::DeepSeekChat => "deepseek",
            Self::KimiK2 => "moonshot",
        }
    }

    /// Default API base URL (without the `/chat/completions` suffix).
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::DeepSeekChat => "https://api.deepseek.com",
            Self::KimiK2 => "https://api.moonshot.cn/v1",
        }
    }

    /// Context window in tokens.
    #[must_use]
    pub fn max_context_tokens(self) -> usize {
        match self {
            Self::DeepSeekChat => 64_000,
            Self::KimiK2 => 128_000,
        }
    }
}

impl fmt::Display for LlmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for LlmModel {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.model_name() == s)
            .ok_or_else(|| LlmError::UnknownModel(s.to_string()))
    }
}
