pub mod history;
pub mod metadata;
