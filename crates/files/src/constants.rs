/// File extension of every generated artifact.
pub const ARTIFACT_EXTENSION: &str = "txt";

/// How many newline-terminated copies of the word an artifact contains.
pub const ARTIFACT_REPETITIONS: usize = 100;
