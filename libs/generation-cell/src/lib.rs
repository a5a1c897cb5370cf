pub mod models;
pub mod services;

pub use models::{GenerationError, GenerationRequest};
pub use services::{HttpTextGenerator, TextGenerator};
