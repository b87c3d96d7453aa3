mod parser;

pub use parser::ParserGenerator;
