use std::str::FromStr;

use crate::models::Credentials;

/// A line typed at the desk prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Credentials),
    Go(String),
    Replace(String),
    Whoami,
    Routes,
    Menu,
    History,
    Intake(String),
    Metrics,
    Logout,
    Help,
    Quit,
}

pub const HELP: &str = "\
login <user> <password> [code]  sign in
go <path>                       navigate, adding a history entry
replace <path>                  navigate, replacing the current entry
whoami                          show the session
routes                          list the live route table
menu                            show the sidebar for the current roles
history                         show the navigation history
intake <file.json>              score and check a patient intake record
metrics                         dump desk metrics
logout                          sign out and reload
help                            this text
quit                            leave the desk";

fn one_path(verb: &str, args: &[&str]) -> Result<String, String> {
    match args {
        [path] => Ok(path.to_string()),
        _ => Err(format!("usage: {} <path>", verb)),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        let command = match (verb.to_lowercase().as_str(), args) {
            ("login", [user, password]) => Command::Login(Credentials::new(*user, *password)),
            ("login", [user, password, code]) => Command::Login(Credentials {
                code: Some(code.to_string()),
                ..Credentials::new(*user, *password)
            }),
            ("login", _) => return Err("usage: login <user> <password> [code]".to_string()),
            ("go" | "push", _) => Command::Go(one_path("go", args)?),
            ("replace", _) => Command::Replace(one_path("replace", args)?),
            ("intake", [file]) => Command::Intake(file.to_string()),
            ("intake", _) => return Err("usage: intake <file.json>".to_string()),
            ("whoami", []) => Command::Whoami,
            ("routes", []) => Command::Routes,
            ("menu", []) => Command::Menu,
            ("history", []) => Command::History,
            ("metrics", []) => Command::Metrics,
            ("logout", []) => Command::Logout,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (other, _) => return Err(format!("unknown command '{}'; try 'help'", other)),
        };
        Ok(command)
    }
}
