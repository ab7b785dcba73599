use std::path::PathBuf;

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Quit,
    Profile,
    Edit,
    Set { name: String, value: String },
    Save,
    Reset,
    Export(PathBuf),
    Help,
    Query(String),
    Invalid(String),
    Empty,
}

pub const HELP: &str = "\
Commands:
  /profile            show your information
  /edit               edit your information field by field
  /set name=value     change one field (multi-choice: comma separated)
  /save               save your information for next time
  /reset              forget the conversation so far
  /export <path>      write the chat to .txt or .json
  exit | quit         leave";

pub fn parse_command(input: &str) -> ChatCommand {
    let line = input.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatCommand::Quit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Query(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "profile" => ChatCommand::Profile,
        "edit" => ChatCommand::Edit,
        "save" => ChatCommand::Save,
        "reset" => ChatCommand::Reset,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        "set" => match shared::utils::split_assignment(arg) {
            Some((name, value)) => ChatCommand::Set {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => ChatCommand::Invalid("usage: /set name=value".to_string()),
        },
        "export" if !arg.is_empty() => ChatCommand::Export(PathBuf::from(arg)),
        "export" => ChatCommand::Invalid("usage: /export <path>".to_string()),
        other => ChatCommand::Invalid(format!("unknown command /{other}, try /help")),
    }
}
