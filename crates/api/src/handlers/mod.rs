pub mod discovery;
pub mod duplicates;
pub mod engagement;
pub mod moderation;
