use super::{is_valid_name, EnvError};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::env;

/// Shell-level variables.
///
/// `exported` entries override the ambient environment of every launched
/// process; `variables` (from `set`) are only visible to `$NAME` expansion.
#[derive(Clone, Debug, Default)]
pub struct EnvVarManager {
    exported: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
}

impl EnvVarManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        if !is_valid_name(name) {
            return Err(EnvError::InvalidName(name.to_string()));
        }

        let clean_value = if name == "PATH" {
            sanitize_path(value)?
        } else {
            value.to_string()
        };

        self.exported.insert(name.to_string(), clean_value);
        Ok(())
    }

    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        if !is_valid_name(name) {
            return Err(EnvError::InvalidName(name.to_string()));
        }
        self.variables.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn exported(&self) -> &BTreeMap<String, String> {
        &self.exported
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Shell variables first, then exports, then the ambient environment.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.variables
            .get(name)
            .or_else(|| self.exported.get(name))
            .cloned()
            .or_else(|| env::var(name).ok())
    }

    /// The complete environment for a launched process.
    pub fn merged(&self) -> BTreeMap<String, String> {
        self.merged_with(env::vars())
    }

    pub fn merged_with<I>(&self, ambient: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged: BTreeMap<String, String> = ambient.into_iter().collect();
        merged.extend(
            self.exported
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        merged
    }

    /// Replaces `$NAME` and `${NAME}` references. Unknown names expand to
    /// nothing; single-quoted text and `\$` are left alone.
    pub fn expand<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if !input.contains('$') {
            return Cow::Borrowed(input);
        }

        let mut out = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_single = false;
        let mut in_double = false;

        while let Some(c) = chars.next() {
            match c {
                '\'' if !in_double => {
                    in_single = !in_single;
                    out.push(c);
                }
                '"' if !in_single => {
                    in_double = !in_double;
                    out.push(c);
                }
                '\\' if !in_single => {
                    out.push(c);
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '$' if !in_single => {
                    let name = match chars.peek() {
                        Some('{') => {
                            chars.next();
                            let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                            Some(name)
                        }
                        Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                            let mut name = String::new();
                            while let Some(&c) = chars.peek() {
                                if !(c.is_ascii_alphanumeric() || c == '_') {
                                    break;
                                }
                                name.push(c);
                                chars.next();
                            }
                            Some(name)
                        }
                        _ => None,
                    };
                    match name {
                        Some(name) => out.push_str(&self.lookup(&name).unwrap_or_default()),
                        None => out.push('$'),
                    }
                }
                _ => out.push(c),
            }
        }

        Cow::Owned(out)
    }
}

fn sanitize_path(path: &str) -> Result<String, EnvError> {
    if path.is_empty() {
        return Err(EnvError::InvalidValue("Empty PATH value"));
    }

    let mut seen = std::collections::HashSet::new();
    let unique_parts: Vec<&str> = path
        .split([':', '"', '\''])
        .filter(|s| !s.is_empty())
        .filter(|part| seen.insert(*part))
        .collect();

    Ok(unique_parts.join(":"))
}
