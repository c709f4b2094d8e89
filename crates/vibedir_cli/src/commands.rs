#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Show,
    Pending(String),
    Remove(usize),
    Quit,
    Usage(&'static str),
    Unknown(String),
}

pub const HELP: &str = "\
/help            show this list
/show            print the conversation and the pending draft
/pending <text>  replace the pending draft
/remove <n>      delete history entry n
/quit            leave the session";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/show" => SlashCommand::Show,
        "/pending" => SlashCommand::Pending(rest.to_string()),
        "/remove" => match rest.parse::<usize>() {
            Ok(index) => SlashCommand::Remove(index),
            Err(_) => SlashCommand::Usage("/remove <n>"),
        },
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
