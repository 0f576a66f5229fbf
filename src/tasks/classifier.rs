//! Keyword based classification of free-text task entries. Tables are fixed and English only.

use std::collections::{BTreeSet, HashSet};

use super::entities::Priority;

/// Checked from the most severe level down. [Priority::Low] is the fallback and has no keywords.
const PRIORITY_KEYWORDS: [(Priority, &[&str]); 2] = [
    (
        Priority::High,
        &[
            "urgent",
            "asap",
            "important",
            "critical",
            "emergency",
            "deadline",
            "exam",
            "immediately",
            "overdue",
        ],
    ),
    (
        Priority::Medium,
        &[
            "soon",
            "meeting",
            "call",
            "review",
            "appointment",
            "submit",
            "prepare",
            "schedule",
            "email",
            "interview",
        ],
    ),
];

const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("meeting", "Work"),
    ("call", "Work"),
    ("client", "Work"),
    ("email", "Work"),
    ("report", "Work"),
    ("project", "Work"),
    ("presentation", "Work"),
    ("office", "Work"),
    ("interview", "Work"),
    ("study", "Education"),
    ("homework", "Education"),
    ("course", "Education"),
    ("learn", "Education"),
    ("read", "Education"),
    ("research", "Education"),
    ("practice", "Education"),
    ("exam", "Academic"),
    ("assignment", "Academic"),
    ("lecture", "Academic"),
    ("thesis", "Academic"),
    ("quiz", "Academic"),
    ("class", "Academic"),
    ("semester", "Academic"),
    ("buy", "Shopping"),
    ("purchase", "Shopping"),
    ("order", "Shopping"),
    ("shop", "Shopping"),
    ("shopping", "Shopping"),
    ("grocery", "Errands"),
    ("groceries", "Errands"),
    ("pickup", "Errands"),
    ("bank", "Errands"),
    ("post", "Errands"),
    ("laundry", "Errands"),
    ("errand", "Errands"),
    ("gym", "Health"),
    ("workout", "Health"),
    ("doctor", "Health"),
    ("exercise", "Health"),
    ("run", "Health"),
    ("dentist", "Health"),
    ("medicine", "Health"),
    ("yoga", "Health"),
    ("pay", "Finance"),
    ("bill", "Finance"),
    ("bills", "Finance"),
    ("rent", "Finance"),
    ("tax", "Finance"),
    ("taxes", "Finance"),
    ("budget", "Finance"),
    ("invoice", "Finance"),
    ("family", "Personal"),
    ("birthday", "Personal"),
    ("friend", "Personal"),
    ("friends", "Personal"),
    ("mom", "Personal"),
    ("dad", "Personal"),
    ("gift", "Personal"),
    ("clean", "Home"),
    ("cook", "Home"),
    ("repair", "Home"),
    ("fix", "Home"),
    ("dishes", "Home"),
    ("garden", "Home"),
];

/// Lower-cased words of `text`. Anything that isn't alphanumeric separates words, so `urgent:`
/// and `(exam)` still produce `urgent` and `exam`.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn classify_priority(tokens: &HashSet<String>) -> Priority {
    PRIORITY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| tokens.contains(*keyword)))
        .map(|(priority, _)| *priority)
        .unwrap_or(Priority::Low)
}

pub fn classify_tags(tokens: &HashSet<String>) -> BTreeSet<String> {
    CATEGORY_KEYWORDS
        .iter()
        .filter(|(keyword, _)| tokens.contains(*keyword))
        .map(|(_, category)| category.to_string())
        .collect()
}

/// Derives priority and category tags for a task text. Unrecognized text is a valid input and
/// yields [Priority::Low] without tags.
pub fn classify(text: &str) -> (Priority, BTreeSet<String>) {
    let tokens = tokenize(text);
    (classify_priority(&tokens), classify_tags(&tokens))
}
