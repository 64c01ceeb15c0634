pub mod builder;
pub mod encoder;
pub mod grouper;
pub mod history;
pub mod interner;
pub mod reader;
pub mod stats;
pub mod tokenizer;
pub mod walker;
