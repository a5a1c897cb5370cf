pub mod client;

pub use client::{HttpTextGenerator, TextGenerator};
