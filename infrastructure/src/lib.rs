pub mod config;
pub mod export;
pub mod form_store;
mod http;
pub mod ollama_client;
pub mod openai_client;
pub mod pdf_extractor;
