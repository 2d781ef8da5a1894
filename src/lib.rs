//! storyforge: turn product documentation into themed decks and lab guides.

pub mod classify;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod generate;
pub mod llm;
pub mod models;
pub mod progress;
pub mod render;
pub mod research;
pub mod store;
pub mod template;
