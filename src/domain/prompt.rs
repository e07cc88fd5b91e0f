//! 系统提示词
//!
//! 以「用户说明 + 模型确认」两轮的形式前置到每次请求的历史之前

use super::conversation::Turn;

pub const DEFAULT_INSTRUCTIONS: &str = "\
You are an expert assistant specialized in Revolt Motors, the Indian electric motorcycle company.
Your responses should be exclusively about Revolt Motors and its products.

Key points to focus on:
- Revolt Motors is India's first AI-enabled electric motorcycle company
- Current models: RV400, RV300
- Battery specifications and range
- Charging options and infrastructure
- Pricing and variants
- Company history and vision
- Comparison with other electric two-wheelers in India
- Government incentives for electric vehicles in India

Important:
1. Respond in the same language the question is asked in
2. If the language cannot be determined, default to English
3. Keep responses concise (1-2 sentences) for voice interaction
4. Maintain professional and helpful tone in all languages

If asked about other topics, politely respond that you specialize only in Revolt Motors.
";

pub const DEFAULT_ACKNOWLEDGEMENT: &str =
    "Understood. I will provide concise information about Revolt Motors in the requested language.";

/// 固定的系统提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    pub instructions: String,
    pub acknowledgement: String,
}

impl SystemPrompt {
    pub fn new(instructions: impl Into<String>, acknowledgement: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            acknowledgement: acknowledgement.into(),
        }
    }

    /// 前置轮次
    pub fn priming_turns(&self) -> [Turn; 2] {
        [
            Turn::user_text(self.instructions.trim()),
            Turn::model_text(self.acknowledgement.trim()),
        ]
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTIONS, DEFAULT_ACKNOWLEDGEMENT)
    }
}
