//! Prompting the model and shaping its answer

pub mod answer;
pub mod prompt;

pub use answer::{llm_failure_json, parse_model_output, AnswerService, REQUIRED_KEYS};
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
