use std::{fs, io, path::Path};

use tracing::{debug, warn};

use super::{Config, ConfigError, ConfigPaths};
use crate::core::env::EnvError;

pub struct ConfigLoader<'a> {
    paths: &'a ConfigPaths,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(paths: &'a ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn load_configs(&self, config: &mut Config) -> Result<(), ConfigError> {
        self.source_if_exists(&self.paths.rc_path, config)
    }

    fn source_if_exists(&self, path: &Path, config: &mut Config) -> Result<(), ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no rc file");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for (index, line) in content.lines().enumerate() {
            if let Err(e) = self.process_line(line, config) {
                warn!(path = %path.display(), line = index + 1, error = %e, "ignoring rc line");
            }
        }
        Ok(())
    }

    fn process_line(&self, line: &str, config: &mut Config) -> Result<(), EnvError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        match line {
            s if s.starts_with("export ") => self.process_env_var(&s["export ".len()..], config),
            s if s.starts_with("PATH=") => self.process_env_var(s, config),
            s if s.starts_with("set ") => self.process_variable(&s["set ".len()..], config),
            s if s.starts_with("alias ") => self.process_alias(&s["alias ".len()..], config),
            _ => Ok(()),
        }
    }

    fn process_env_var(&self, var_def: &str, config: &mut Config) -> Result<(), EnvError> {
        let (name, value) = definition(var_def)?;
        let expanded = config.env_vars.expand(value);
        config.env_vars.export(name, &expanded)
    }

    fn process_variable(&self, var_def: &str, config: &mut Config) -> Result<(), EnvError> {
        let (name, value) = definition(var_def)?;
        let expanded = config.env_vars.expand(value);
        config.env_vars.set_variable(name, &expanded)
    }

    fn process_alias(&self, line: &str, config: &mut Config) -> Result<(), EnvError> {
        let (name, command) = definition(line)?;
        config.aliases.add(name, command);
        Ok(())
    }
}

/// Splits `NAME=VALUE`, trimming both sides and one layer of matching quotes
/// around the value.
fn definition(def: &str) -> Result<(&str, &str), EnvError> {
    let (name, value) = def
        .split_once('=')
        .ok_or(EnvError::InvalidValue("expected NAME=VALUE"))?;
    Ok((name.trim(), strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load(content: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join("atriumrc");
        fs::write(&rc, content).unwrap();
        let paths = ConfigPaths::from_home(dir.path()).with_rc(rc);
        Config::load(paths).unwrap()
    }

    #[test]
    fn test_process_env_var() {
        let config = load("export TEST_VAR=\"hello world\"\n");
        assert_eq!(config.env_vars.exported()["TEST_VAR"], "hello world");
    }

    #[test]
    fn test_path_line_expands_existing_value() {
        let config = load("export BASE=/opt\nPATH=$BASE/bin:/usr/bin:/usr/bin\n");
        assert_eq!(config.env_vars.exported()["PATH"], "/opt/bin:/usr/bin");
    }

    #[test]
    fn test_process_alias_and_set() {
        let config = load("# comment\n\nalias ll='ls -la'\nset GREETING=hi\n");
        assert_eq!(config.aliases.get("ll").unwrap(), "ls -la");
        assert_eq!(config.env_vars.variables()["GREETING"], "hi");
        assert!(config.env_vars.exported().get("GREETING").is_none());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let config = load("export 1BAD=x\nexport NOEQUALS\nexport GOOD=yes\n");
        assert_eq!(config.env_vars.exported().len(), 1);
        assert_eq!(config.env_vars.exported()["GOOD"], "yes");
    }

    #[test]
    fn test_missing_rc_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_home(dir.path());
        let config = Config::load(paths).unwrap();
        assert!(config.env_vars.exported().is_empty());
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"a b\""), "a b");
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
