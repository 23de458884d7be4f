//! Commands read from stdin while monitoring runs.

use std::str::FromStr;

use anyhow::bail;

/// A line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Hide the view: stop ticking, keep series.
    Pause,
    /// Show the view again.
    Resume,
    /// Turn monitoring on for the machine.
    Enable,
    /// Turn monitoring off; discovered series are dropped.
    Disable,
    /// Print state and the latest reading of every series.
    Status,
    Help,
    Quit,
}

impl Command {
    pub const HELP: &'static str =
        "commands: pause | resume | enable | disable | status | help | quit";
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s.trim().to_ascii_lowercase().as_str() {
            "pause" | "hide" | "p" => Command::Pause,
            "resume" | "show" | "r" => Command::Resume,
            "enable" | "on" => Command::Enable,
            "disable" | "off" => Command::Disable,
            "status" | "s" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "" => bail!("empty command ({})", Command::HELP),
            other => bail!("unknown command '{}' ({})", other, Command::HELP),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!("pause".parse::<Command>().unwrap(), Command::Pause);
        assert_eq!(" Resume \n".parse::<Command>().unwrap(), Command::Resume);
        assert_eq!("on".parse::<Command>().unwrap(), Command::Enable);
        assert_eq!("OFF".parse::<Command>().unwrap(), Command::Disable);
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_unknown_input() {
        let err = "reboot".parse::<Command>().unwrap_err();
        assert!(err.to_string().contains("unknown command 'reboot'"));
        assert!("   ".parse::<Command>().is_err());
    }
}
