pub mod ast;
pub mod diagnostics;
pub mod fold;
pub mod lex;
pub mod parse;
pub mod printer;
pub mod semantic;
pub mod stream;
pub mod symbols;
pub mod token;
