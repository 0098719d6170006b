pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod identifier;
pub mod parser;
pub mod position;
pub mod pretty;
pub mod program;
pub mod typ;
pub mod typecheck;
