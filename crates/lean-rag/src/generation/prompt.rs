//! Prompt template for JSON answers

/// Instruction block at the top of every prompt
pub const SYSTEM_PROMPT: &str = r#"You are a precise domain assistant.
Output ONLY ONE JSON object with this exact schema:
{"answer": string, "commands": [{"tool": string, "args": object}], "citations": [{"doc_id": string, "page": int}]}
Never output null. If unsure, provide a brief clarification question in "answer" and leave "commands" empty.
"#;

/// Prompt builder for answer generation
pub struct PromptBuilder;

impl PromptBuilder {
    /// Full prompt: instructions, the question, the context block and an example reply
    pub fn build_answer_prompt(question: &str, context: &str) -> String {
        format!(
            r#"{system}

Question: {question}

Context passages (ID#page :: text):
{context}

Return ONLY valid JSON like:
{{"answer":"...", "commands":[{{"tool":"open_url","args":{{"url":"..."}}}}], "citations":[{{"doc_id":"...","page":0}}]}}
"#,
            system = SYSTEM_PROMPT,
            question = question,
            context = context,
        )
    }
}
