//! Retrieval-augmented answering: stages, answers, prompts and errors

mod answer;
mod error;
mod prompt;

pub use answer::{confidence, RagAnswer, RagStage};
pub use error::AskError;
pub use prompt::{assemble_context, build_answer_prompt, CONTEXT_SEPARATOR};
