/// Question bank records as read from disk.
pub mod models;
/// Question-set providers and the trait they share.
pub mod question_sets;
/// Errors shared by provider backends.
pub mod storage;
