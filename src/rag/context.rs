//! Context assembly from retrieved passages

use crate::models::RetrievedPassage;

/// Placed between passages in the assembled context
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Joined passage text and how many passages made it in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    pub sources: usize,
}

impl AssembledContext {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Assembler for creating context from search results
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler bounded to `max_context_length` chars
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Join non-blank passages in the order given, whole passages only.
    /// A passage that would overflow the budget is skipped; later, shorter
    /// ones may still fit.
    #[must_use]
    pub fn assemble(&self, passages: &[RetrievedPassage]) -> AssembledContext {
        let mut context = AssembledContext::default();
        let mut total_length = 0;
        let separator_length = CONTEXT_SEPARATOR.chars().count();

        for passage in passages.iter().filter(|p| !p.text.trim().is_empty()) {
            let separator = if context.sources == 0 { 0 } else { separator_length };
            let entry_length = separator + passage.text.chars().count();

            if total_length + entry_length > self.max_context_length {
                continue;
            }

            if separator > 0 {
                context.text.push_str(CONTEXT_SEPARATOR);
            }
            context.text.push_str(&passage.text);
            context.sources += 1;
            total_length += entry_length;
        }

        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(30_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let passages = vec![
            passage("low score first", 0.1),
            passage("high score second", 0.9),
            passage("middle third", 0.5),
        ];

        let context = ContextAssembler::default().assemble(&passages);
        assert_eq!(
            context.text,
            "low score first\n\n---\n\nhigh score second\n\n---\n\nmiddle third"
        );
        assert_eq!(context.sources, 3);
    }

    #[test]
    fn test_blank_passages_are_dropped() {
        let passages = vec![passage("", 0.9), passage(" \n\t", 0.8), passage("heap", 0.7)];

        let context = ContextAssembler::default().assemble(&passages);
        assert_eq!(context.text, "heap");
        assert_eq!(context.sources, 1);
    }

    #[test]
    fn test_empty_input_gives_empty_context() {
        let context = ContextAssembler::default().assemble(&[]);
        assert!(context.is_empty());
        assert_eq!(context.sources, 0);
    }

    #[test]
    fn test_passages_over_budget_are_skipped() {
        // "aaaa" + separator(7) + "bbbb" = 15 chars
        let passages = vec![passage("aaaa", 0.9), passage("bbbb", 0.8), passage("c", 0.7)];

        let context = ContextAssembler::new(15).assemble(&passages);
        assert_eq!(context.text, "aaaa\n\n---\n\nbbbb");

        let context = ContextAssembler::new(14).assemble(&passages);
        assert_eq!(context.text, "aaaa\n\n---\n\nc");
        assert_eq!(context.sources, 2);
    }

    #[test]
    fn test_oversized_top_passage_does_not_empty_context() {
        let long = "x".repeat(50);
        let passages = vec![passage(&long, 0.9), passage("A stack is LIFO.", 0.8)];

        let context = ContextAssembler::new(20).assemble(&passages);
        assert_eq!(context.text, "A stack is LIFO.");
        assert_eq!(context.sources, 1);
    }
}
