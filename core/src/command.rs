//! Command: the typed interface for every chat verb the bot understands.
//!
//! Inbound lines are parsed into a `Command` by `parse::parse_line` and
//! executed by `Dispatcher::execute`. The `VERBS` table is the single source
//! of verb names, minimum token counts and usage strings.
//!
//! | Verb | Min tokens | Effect |
//! |------|-----------|--------|
//! | `addsite <site>` | 2 | create record |
//! | `delsite <site>` | 2 | delete record |
//! | `site <site>` | 2 | display record |
//! | `sites` | 1 | list all names |
//! | `set <site> <field> <value...>` | 4 | overwrite attribute |
//! | `add <site> <field> <value...>` | 4 | union into set attribute |
//! | `rm <site> <field> <value...>` | 4 | difference from set attribute |
//! | `search <field> <value>` | 3 | find matching records |
//! | `help [verb]` | 1 | list verbs |
//! | `reload` | 1 | handed to the host process |


/// A parsed chat command. Site names and values are raw, as typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddSite { site: String },
    DelSite { site: String },
    Site { site: String },
    Sites,
    Set { site: String, field: String, values: Vec<String> },
    Add { site: String, field: String, values: Vec<String> },
    Rm { site: String, field: String, values: Vec<String> },
    Search { field: String, values: Vec<String> },
    Help { topic: Option<String> },
    /// Intercepted before dispatch; the host owns process lifecycle.
    Reload,
}

impl Command {
    /// The verb name without prefix, for logging.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::AddSite { .. } => "addsite",
            Command::DelSite { .. } => "delsite",
            Command::Site { .. } => "site",
            Command::Sites => "sites",
            Command::Set { .. } => "set",
            Command::Add { .. } => "add",
            Command::Rm { .. } => "rm",
            Command::Search { .. } => "search",
            Command::Help { .. } => "help",
            Command::Reload => "reload",
        }
    }
}


/// Static description of one verb.
#[derive(Debug, PartialEq, Eq)]
pub struct VerbSpec {
    pub name: &'static str,
    /// Minimum token count, the verb itself included.
    pub min_tokens: usize,
    /// Argument synopsis shown after the verb in usage lines.
    pub args: &'static str,
    pub summary: &'static str,
}

impl VerbSpec {
    /// Usage synopsis with the configured prefix, e.g. `!site <site>`.
    pub fn usage(&self, prefix: char) -> String {
        if self.args.is_empty() {
            format!("{}{}", prefix, self.name)
        } else {
            format!("{}{} {}", prefix, self.name, self.args)
        }
    }
}


pub const RELOAD_VERB: &str = "reload";

pub const VERBS: &[VerbSpec] = &[
    VerbSpec { name: "addsite", min_tokens: 2, args: "<site>", summary: "Add a new site" },
    VerbSpec { name: "delsite", min_tokens: 2, args: "<site>", summary: "Delete a site" },
    VerbSpec { name: "site", min_tokens: 2, args: "<site>", summary: "Show a site" },
    VerbSpec { name: "sites", min_tokens: 1, args: "", summary: "List all sites" },
    VerbSpec {
        name: "set",
        min_tokens: 4,
        args: "<site> <field> <value...>",
        summary: "Overwrite a field",
    },
    VerbSpec {
        name: "add",
        min_tokens: 4,
        args: "<site> <field> <value...>",
        summary: "Add values to a list field",
    },
    VerbSpec {
        name: "rm",
        min_tokens: 4,
        args: "<site> <field> <value...>",
        summary: "Remove values from a list field",
    },
    VerbSpec {
        name: "search",
        min_tokens: 3,
        args: "<field> <value>",
        summary: "Find sites by field value",
    },
    VerbSpec { name: "help", min_tokens: 1, args: "[command]", summary: "List commands" },
    VerbSpec { name: RELOAD_VERB, min_tokens: 1, args: "", summary: "Reload the bot" },
];


/// Look up a verb by name (without prefix).
pub fn verb_spec(name: &str) -> Option<&'static VerbSpec> {
    VERBS.iter().find(|v| v.name == name)
}
