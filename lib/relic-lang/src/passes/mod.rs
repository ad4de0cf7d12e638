pub mod parse;
pub mod resolve;
