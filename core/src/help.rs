//! Help system: generates usage text for the chat verbs.
//!
//! Two levels of detail:
//!
//! 1. **Overview** (`!help`) - every verb on one line
//! 2. **Verb help** (`!help set`) - usage and summary for one verb

use crate::command::{verb_spec, VERBS};
use crate::format::bold;


/// Generate help lines for a given topic.
pub fn help_text(prefix: char, topic: Option<&str>) -> Vec<String> {
    match topic {
        None => vec![overview(prefix)],
        Some(t) => match verb_spec(t) {
            Some(spec) => vec![format!("{} - {}", bold(&spec.usage(prefix)), spec.summary)],
            None => vec![format!(
                "Unknown command: `{}`. Use {}help for a list of commands.",
                t, prefix
            )],
        },
    }
}


/// Usage line for a verb invoked with too few arguments.
pub fn usage_line(prefix: char, verb: &str) -> String {
    match verb_spec(verb) {
        Some(spec) => format!("{} {}", bold("Usage:"), spec.usage(prefix)),
        None => format!("{} {}help", bold("Usage:"), prefix),
    }
}


fn overview(prefix: char) -> String {
    let mut names: Vec<String> = VERBS.iter().map(|v| format!("{}{}", prefix, v.name)).collect();
    names.sort();
    format!("{} {}", bold("Available commands:"), names.join(" "))
}
