//! Instruction templates and AI completions

use serde::{Deserialize, Serialize};

/// Model requested when the caller does not pick one
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Summary of a stored instruction template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub technology: String,
    #[serde(rename = "strictRules", default)]
    pub strict_rules: Vec<String>,
    /// First 100 characters of the instruction text
    #[serde(default)]
    pub summary: String,
}

/// One page of `GET /instructions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstructionPage {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl InstructionPage {
    pub fn find(&self, id: &str) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_id: Option<String>,
    pub model: String,
}

impl CompletionRequest {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            instruction_id: None,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }

    pub fn with_instruction(mut self, id: impl Into<String>) -> Self {
        self.instruction_id = Some(id.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub response: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_page_from_server() {
        let body = r#"{
            "page": 1,
            "page_size": 10,
            "total_instructions": 2,
            "total_pages": 1,
            "instructions": [
                {"id": "a1", "technology": "React", "strictRules": ["no classes"], "summary": "Build..."},
                {"id": "b2", "technology": "Rust"}
            ]
        }"#;
        let page: InstructionPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.instructions.len(), 2);
        assert_eq!(page.find("a1").unwrap().strict_rules, vec!["no classes"]);
        assert_eq!(page.find("b2").unwrap().summary, "");
        assert!(page.find("zz").is_none());
    }

    #[test]
    fn test_completion_request_body() {
        let plain = serde_json::to_value(CompletionRequest::new("hi")).unwrap();
        assert_eq!(
            plain,
            serde_json::json!({"user_prompt": "hi", "model": "gpt-4o"})
        );

        let full = CompletionRequest::new("hi")
            .with_instruction("a1")
            .with_model("gpt-4");
        assert_eq!(
            serde_json::to_value(full).unwrap(),
            serde_json::json!({"user_prompt": "hi", "instruction_id": "a1", "model": "gpt-4"})
        );
    }

    #[test]
    fn test_completion_without_usage() {
        let completion: Completion = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        assert_eq!(completion.response, "ok");
        assert_eq!(completion.usage, None);
    }
}
