//! Wire-level chat clients for the supported backends

mod anthropic;
pub(crate) mod http_client;
mod openai;

pub use anthropic::AnthropicProvider;
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiProvider;
