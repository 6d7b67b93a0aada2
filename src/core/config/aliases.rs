use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct AliasManager {
    aliases: HashMap<Box<str>, Box<str>>,
}

impl AliasManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, command: &str) {
        self.aliases.insert(name.into(), command.into());
    }

    pub fn get<'a>(&'a self, cmd: &str) -> Option<Cow<'a, str>> {
        self.aliases.get(cmd).map(|s| Cow::Borrowed(&**s))
    }

    /// Replaces the first word with its alias, if it has one. The alias
    /// value is split with shell quoting rules. Expansion is not repeated.
    pub fn expand_words(&self, mut words: Vec<String>) -> Vec<String> {
        let Some(first) = words.first() else {
            return words;
        };
        let Some(value) = self.aliases.get(first.as_str()) else {
            return words;
        };

        let mut expanded = shlex::split(value)
            .unwrap_or_else(|| value.split_whitespace().map(String::from).collect());
        expanded.extend(words.drain(1..));
        expanded
    }

    /// All aliases, sorted by name.
    pub fn get_all(&self) -> BTreeMap<Cow<'_, str>, Cow<'_, str>> {
        self.aliases
            .iter()
            .map(|(k, v)| (Cow::Borrowed(&**k), Cow::Borrowed(&**v)))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.aliases.keys().map(|k| k.to_string()).collect()
    }
}
