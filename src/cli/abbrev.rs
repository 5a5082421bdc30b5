// Command abbreviation matching for the tasktree shell

/// Find all commands that start with the given prefix (case-insensitive)
pub fn find_matching_commands<'a>(prefix: &str, commands: &'a [&str]) -> Vec<&'a str> {
    let prefix_lower = prefix.to_lowercase();
    commands.iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect()
}

/// Find a unique command match for the given prefix
/// Returns Ok(command) if exactly one match, Err(matches) if ambiguous, Err(empty) if no match
/// Note: Exact matches take precedence over prefix matches (e.g., "backup" matches "backup" not "backups")
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    let prefix_lower = prefix.to_lowercase();
    for cmd in commands {
        if cmd.to_lowercase() == prefix_lower {
            return Ok(*cmd);
        }
    }

    let matches = find_matching_commands(prefix, commands);

    if matches.is_empty() {
        Err(Vec::new())
    } else if matches.len() == 1 {
        Ok(matches[0])
    } else {
        Err(matches)
    }
}

/// Every verb the shell understands, aliases included
pub const VERBS: &[&str] = &[
    "add", "+", "create",
    "done",
    "undo",
    "remove", "rm", "del",
    "edit",
    "finish",
    "revert",
    "show", "reveal",
    "hide", "unhide",
    "delay", "undelay",
    "open", "cd",
    "back", "up", "..",
    "home",
    "delall",
    "backup", "backups", "restore",
    "help",
    "quit", "q", "exit",
];

/// Map an alias onto the verb it stands for
pub fn canonical_verb(verb: &str) -> &str {
    match verb {
        "+" | "create" => "add",
        "rm" | "del" => "remove",
        "reveal" => "show",
        "cd" => "open",
        "up" | ".." => "back",
        "q" | "exit" => "quit",
        other => other,
    }
}

/// Expand an abbreviated verb to its canonical form
///
/// Prefixes that match several aliases of the same verb are not ambiguous.
pub fn expand_verb(input: &str) -> Result<&'static str, Vec<&'static str>> {
    match find_unique_command(input, VERBS) {
        Ok(verb) => Ok(canonical_verb(verb)),
        Err(matches) => {
            let mut verbs: Vec<&'static str> = matches.into_iter().map(canonical_verb).collect();
            verbs.dedup();
            if verbs.len() == 1 {
                Ok(verbs[0])
            } else {
                Err(verbs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matching_commands() {
        let commands = &["backup", "backups", "back"];
        assert_eq!(find_matching_commands("ba", commands), vec!["backup", "backups", "back"]);
        assert_eq!(find_matching_commands("backu", commands), vec!["backup", "backups"]);
        assert!(find_matching_commands("x", commands).is_empty());
    }

    #[test]
    fn test_exact_match_wins() {
        assert_eq!(find_unique_command("backup", VERBS), Ok("backup"));
        assert_eq!(find_unique_command("q", VERBS), Ok("q"));
        assert_eq!(find_unique_command("DONE", VERBS), Ok("done"));
    }

    #[test]
    fn test_expand_verb() {
        assert_eq!(expand_verb("fin"), Ok("finish"));
        assert_eq!(expand_verb("rever"), Ok("revert"));
        assert!(expand_verb("rev").is_err());
        assert_eq!(expand_verb("rm"), Ok("remove"));
        assert_eq!(expand_verb("+"), Ok("add"));
        assert_eq!(expand_verb(".."), Ok("back"));
        assert_eq!(expand_verb("exit"), Ok("quit"));
        assert_eq!(expand_verb("cr"), Ok("add"));
    }

    #[test]
    fn test_expand_verb_ambiguous() {
        let err = expand_verb("un").unwrap_err();
        assert_eq!(err, vec!["undo", "unhide", "undelay"]);
        assert!(expand_verb("de").is_err());
        assert_eq!(expand_verb("zzz"), Err(Vec::new()));
    }
}
