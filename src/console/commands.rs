use crate::schema::SectionId;

pub const HELP: &str = "\
Commands:
  show [section|all]          print sections (mt5, general, risk, strategies, sessions)
  expand <section>            include a section in `show`
  collapse <section>          hide a section from `show`
  reveal                      toggle password display
  get <path>                  print the value at a dotted path
  set <path> <value>          set a field (type taken from the field catalog)
  list <path> <a, b, c>       set a comma-separated list
  enable <strategy>           add to active_strategies
  disable <strategy>          remove from active_strategies
  toggle <path> <item> on|off add/remove an item in any list
  diff                        list paths that differ from the saved config
  status                      editor state and last save time
  save                        send the whole config to the bot
  reset                       discard unsaved changes (asks first)
  reload                      fetch the config again
  help                        this text
  quit                        leave the editor";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show(Option<SectionId>),
    ShowAll,
    Expand(SectionId),
    Collapse(SectionId),
    Reveal,
    Get(String),
    Set { path: String, raw: String },
    List { path: String, raw: String },
    Toggle { path: String, member: String, present: bool },
    Diff,
    Status,
    Save,
    Reset,
    Reload,
    Help,
    Quit,
}

fn section(arg: &str) -> Result<SectionId, String> {
    SectionId::from_str(arg).ok_or_else(|| format!("unknown section '{}'", arg))
}

fn on_off(arg: &str) -> Result<bool, String> {
    match arg.to_lowercase().as_str() {
        "on" | "true" | "yes" | "add" => Ok(true),
        "off" | "false" | "no" | "remove" => Ok(false),
        _ => Err(format!("expected on|off, got '{}'", arg)),
    }
}

/// Parses one input line. Values keep their inner spacing, so
/// `set mt5_credentials.server Exness MT5 Real` stores "Exness MT5 Real".
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let need = |what: &str| -> Result<(), String> {
        if rest.is_empty() {
            Err(format!("usage: {} {}", word, what))
        } else {
            Ok(())
        }
    };

    match word.to_lowercase().as_str() {
        "show" | "ls" => match rest {
            "" => Ok(Command::Show(None)),
            "all" => Ok(Command::ShowAll),
            s => Ok(Command::Show(Some(section(s)?))),
        },
        "expand" => {
            need("<section>")?;
            Ok(Command::Expand(section(rest)?))
        }
        "collapse" => {
            need("<section>")?;
            Ok(Command::Collapse(section(rest)?))
        }
        "reveal" => Ok(Command::Reveal),
        "get" => {
            need("<path>")?;
            Ok(Command::Get(rest.to_string()))
        }
        "set" | "list" => {
            need("<path> <value>")?;
            let (path, raw) = rest
                .split_once(char::is_whitespace)
                .map(|(p, r)| (p.to_string(), r.trim().to_string()))
                .unwrap_or_else(|| (rest.to_string(), String::new()));
            if word.eq_ignore_ascii_case("set") {
                Ok(Command::Set { path, raw })
            } else {
                Ok(Command::List { path, raw })
            }
        }
        "enable" | "disable" => {
            need("<strategy>")?;
            Ok(Command::Toggle {
                path: crate::schema::ACTIVE_STRATEGIES_PATH.to_string(),
                member: rest.to_string(),
                present: word.eq_ignore_ascii_case("enable"),
            })
        }
        "toggle" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                [path, member, flag] => Ok(Command::Toggle {
                    path: path.to_string(),
                    member: member.to_string(),
                    present: on_off(flag)?,
                }),
                _ => Err("usage: toggle <path> <item> on|off".to_string()),
            }
        }
        "diff" => Ok(Command::Diff),
        "status" => Ok(Command::Status),
        "save" => Ok(Command::Save),
        "reset" => Ok(Command::Reset),
        "reload" => Ok(Command::Reload),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command '{}', try `help`", other)),
    }
}
