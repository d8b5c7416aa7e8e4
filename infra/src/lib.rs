pub mod documents;
pub mod persistence;
