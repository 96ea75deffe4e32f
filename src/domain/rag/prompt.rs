//! Context assembly and answer prompt construction

use crate::domain::knowledge::SearchHit;
use crate::domain::provider::Prompt;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const SYSTEM_PROMPT: &str = "You are a knowledgeable assistant for a training and marketing platform. \
Answer the user's question using only the provided context. \
If the context does not contain the answer, say that you don't know. \
Be concise and cite document titles where helpful.";

/// Join hits in store order as `"{title}\n{chunk}"` blocks
pub fn assemble_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("{}\n{}", hit.title, hit.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// System instruction plus context and question as the user turn
pub fn build_answer_prompt(context: &str, question: &str) -> Prompt {
    let context = if context.is_empty() {
        "(no relevant documents found)"
    } else {
        context
    };

    Prompt::user(format!("Context:\n{}\n\nQuestion: {}", context, question))
        .with_system(SYSTEM_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn hit(title: &str, content: &str) -> SearchHit {
        SearchHit {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            chunk_index: 0,
            content: content.into(),
            similarity: 0.8,
            title: title.into(),
            source_url: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_assemble_context_format() {
        let context = assemble_context(&[hit("Pricing", "Plans start at $10."), hit("FAQ", "Yes.")]);

        assert_eq!(context, "Pricing\nPlans start at $10.\n\n---\n\nFAQ\nYes.");
    }

    #[test]
    fn test_assemble_context_empty() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn test_build_answer_prompt() {
        let prompt = build_answer_prompt("Pricing\nPlans start at $10.", "How much?");

        assert!(prompt.system.is_some());
        assert!(prompt.user.contains("Plans start at $10."));
        assert!(prompt.user.ends_with("Question: How much?"));
    }

    #[test]
    fn test_build_answer_prompt_without_context() {
        let prompt = build_answer_prompt("", "Anything?");

        assert!(prompt.user.contains("no relevant documents"));
    }
}
