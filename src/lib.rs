pub mod answers;
pub mod db;
pub mod format;
pub mod insights;
pub mod intent;
pub mod models;
