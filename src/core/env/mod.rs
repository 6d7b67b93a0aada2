mod vars;

pub use vars::EnvVarManager;

#[derive(Debug)]
pub enum EnvError {
    HomeDirNotFound,
    InvalidName(String),
    InvalidValue(&'static str),
}

impl std::fmt::Display for EnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvError::HomeDirNotFound => write!(f, "Home directory not found"),
            EnvError::InvalidName(name) => write!(f, "not a valid identifier: '{}'", name),
            EnvError::InvalidValue(val) => write!(f, "Invalid value: {}", val),
        }
    }
}

impl std::error::Error for EnvError {}

/// Shell identifier rules: a letter or `_`, then letters, digits or `_`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a `NAME=VALUE` word. Returns `None` when there is no `=`.
pub fn split_assignment(word: &str) -> Option<(&str, &str)> {
    word.split_once('=')
}
