use crate::command::{verb_spec, Command, VerbSpec, RELOAD_VERB};


/// Parse one inbound chat line into a typed Command.
///
/// - `Ok(None)` - not a command (no prefix, unknown verb, blank line);
///   ordinary chat passes through untouched.
/// - `Err(spec)` - a known verb with too few arguments; the caller replies
///   with that verb's usage.
/// - `Ok(Some(cmd))` - ready to execute.
pub fn parse_line(line: &str, prefix: char) -> Result<Option<Command>, &'static VerbSpec> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let Some(verb) = first.strip_prefix(prefix) else {
        return Ok(None);
    };

    // Reload never reaches generic dispatch.
    if verb == RELOAD_VERB {
        return Ok(Some(Command::Reload));
    }

    let Some(spec) = verb_spec(verb) else {
        return Ok(None);
    };
    if tokens.len() < spec.min_tokens {
        return Err(spec);
    }

    let args = &tokens[1..];
    let cmd = match spec.name {
        "addsite" => Command::AddSite { site: args[0].into() },
        "delsite" => Command::DelSite { site: args[0].into() },
        "site" => Command::Site { site: args[0].into() },
        "sites" => Command::Sites,
        "set" => Command::Set {
            site: args[0].into(),
            field: args[1].into(),
            values: owned(&args[2..]),
        },
        "add" => Command::Add {
            site: args[0].into(),
            field: args[1].into(),
            values: owned(&args[2..]),
        },
        "rm" => Command::Rm {
            site: args[0].into(),
            field: args[1].into(),
            values: owned(&args[2..]),
        },
        "search" => Command::Search {
            field: args[0].into(),
            values: owned(&args[1..]),
        },
        "help" => Command::Help {
            topic: args.first().map(|t| t.trim_start_matches(prefix).to_string()),
        },
        _ => return Ok(None),
    };
    Ok(Some(cmd))
}


fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
