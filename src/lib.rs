//! Parley library exports for testing

pub mod core;
pub mod llm;
pub mod tui;

#[cfg(test)]
pub mod test_support;
