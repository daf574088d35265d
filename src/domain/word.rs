//! Word-of-the-day dictionary entry.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordOfDay {
    pub word: String,
    pub pronunciation: Option<String>,
    pub part_of_speech: Option<String>,
    pub definitions: Vec<String>,
}

impl WordOfDay {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Self::default()
        }
    }
}
