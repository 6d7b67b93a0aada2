use crate::error::ShellError;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Tilde expansion for paths and command arguments.
#[derive(Debug, Clone, Default)]
pub struct PathExpander {
    home: Option<PathBuf>,
}

impl PathExpander {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    pub fn home_dir(&self) -> Result<&Path, ShellError> {
        self.home.as_deref().ok_or(ShellError::HomeDirNotFound)
    }

    pub fn is_home_path(&self, path: &str) -> bool {
        path == "~" || path.starts_with("~/")
    }

    /// Expands `~` and `~/...`. `~user` forms are returned unchanged.
    pub fn expand(&self, path: &str) -> Result<PathBuf, ShellError> {
        if path == "~" {
            return Ok(self.home_dir()?.to_path_buf());
        }
        match path.strip_prefix("~/") {
            Some(rest) => Ok(self.home_dir()?.join(rest)),
            None => Ok(Path::new(path).to_path_buf()),
        }
    }

    /// Expands a command argument, leaving it untouched when no home
    /// directory is known.
    pub fn expand_word<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if !self.is_home_path(word) {
            return Cow::Borrowed(word);
        }
        match self.expand(word) {
            Ok(path) => Cow::Owned(path.to_string_lossy().into_owned()),
            Err(_) => Cow::Borrowed(word),
        }
    }
}
