pub mod span;
pub mod url;
