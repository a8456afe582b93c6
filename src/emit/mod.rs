pub mod dot;
pub mod yaml;
