// AI integration
//
// The dataset is summarized into a bounded prompt and sent to a chat
// completion endpoint. A failed call yields an absent answer plus the error
// to show; nothing here retries.

mod client;
mod prompt;

pub use client::{
    Answer, AnswerService, AskOutcome, ChatMessage, ChatRequest, CompletionBackend,
    CompletionError, OpenAIClient, SYSTEM_PROMPT,
};
pub use prompt::{
    build_prompt, compose_prompt, truncate_dataset_text, BuiltPrompt, PromptLimits,
    TruncationNotice, PROMPT_PREAMBLE, QUESTION_LABEL,
};
