//! Prompts for the chat pipeline

/// System instruction for turning a follow-up into a standalone question
pub const QUERY_REWRITE_INSTRUCTION: &str = "You are a query rewriting expert.
Rephrase the follow-up question into a standalone question.
Only output the rewritten question, no explanations.
If it is a greeting like hi, hello, or how can you help me, keep the meaning the same.";

/// User content for the rewrite call
pub fn build_rewrite_request(user_history: &[String], question: &str) -> String {
    format!(
        "Previous user messages:\n{}\nFollow-up question: {}",
        user_history.join("\n"),
        question
    )
}

/// System instruction for the grounded answer, with the context appended
pub fn build_answer_instruction(persona: &str, fallback_message: &str, context: &str) -> String {
    format!(
        r#"You are {persona}.
Answer ONLY from the provided context.
If the answer is not in the context, reply exactly: "{fallback_message}"

Formatting:
1. Start with a short definition or direct answer
2. Follow with the key points as a bulleted list
3. If the question continues an earlier answer, build on it instead of repeating it

Context:
{context}"#
    )
}
