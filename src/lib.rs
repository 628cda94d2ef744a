pub mod ir;
pub mod parser;
pub mod pass;
pub mod simplify;
pub mod ty;
pub mod utils;
