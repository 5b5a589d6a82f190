pub mod annotate;
pub mod buffer;
pub mod config;
pub mod error;
pub mod lexer;
pub mod mining;
pub mod rewrite;
pub mod text;
pub mod typed;
