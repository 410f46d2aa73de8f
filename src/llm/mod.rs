pub mod client;
pub mod openai_client;

pub use client::EndpointClassifier;
pub use openai_client::OpenAiClassifier;
