//! Default value functions for configuration.

pub fn default_command_prefix() -> char {
    '!'
}

pub fn default_quit_message() -> String {
    "ircore".to_string()
}

pub fn default_port() -> u16 {
    6667
}

pub fn default_username() -> String {
    "bot".to_string()
}
