//! Prompt construction.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTRUCTION: &str = "Explain the following JSON object in detail, focusing on medical/scientific concepts and keeping the format brief and informative";

/// Renders `"<instruction>:\n\n<canonical value>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    instruction: String,
}

impl PromptTemplate {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    pub fn render(&self, canonical_value: &str) -> String {
        format!("{}:\n\n{}", self.instruction, canonical_value)
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render() {
        let p = PromptTemplate::default().render(r#"{"Aspirin":"NSAID"}"#);
        assert!(p.starts_with("Explain the following JSON object in detail"));
        assert!(p.ends_with(":\n\n{\"Aspirin\":\"NSAID\"}"));
    }

    #[test]
    fn test_custom_instruction() {
        let p = PromptTemplate::new("Summarize").render("x");
        assert_eq!(p, "Summarize:\n\nx");
    }
}
