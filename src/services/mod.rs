pub mod image;
pub mod input;
pub mod llm;
pub mod render;
pub mod script;
pub mod source;
pub mod workflow;
