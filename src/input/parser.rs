use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnbalancedQuotes,
    EmptyStage,
    Unsupported(&'static str),
    MisplacedBackground,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnbalancedQuotes => write!(f, "syntax error: unbalanced quotes"),
            ParseError::EmptyStage => write!(f, "syntax error near unexpected token `|'"),
            ParseError::Unsupported(op) => write!(f, "syntax error: `{}' is not supported", op),
            ParseError::MisplacedBackground => {
                write!(f, "syntax error: `&' is only allowed at the end of a line")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A line split into pipeline stages, each stage tokenised into words.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    stages: Vec<Vec<String>>,
    background: bool,
}

impl CommandLine {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (segments, background) = split_segments(line.trim())?;
        if segments.len() == 1 && segments[0].trim().is_empty() {
            if background {
                return Err(ParseError::MisplacedBackground);
            }
            return Ok(Self::default());
        }

        let stages = segments
            .iter()
            .map(|segment| {
                let words = shlex::split(segment).ok_or(ParseError::UnbalancedQuotes)?;
                if words.is_empty() {
                    Err(ParseError::EmptyStage)
                } else {
                    Ok(words)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { stages, background })
    }

    pub fn stages(&self) -> &[Vec<String>] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Vec<String>> {
        self.stages
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Splits at unquoted `|` and strips one trailing unquoted `&`.
fn split_segments(line: &str) -> Result<(Vec<&str>, bool), ParseError> {
    let bytes = line.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_single = false;
    let mut in_double = false;
    let mut background_at = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if background_at.is_some() && !c.is_ascii_whitespace() {
            return Err(ParseError::MisplacedBackground);
        }
        match c {
            b'\\' if !in_single => i += 1,
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'|' if !in_single && !in_double => {
                if bytes.get(i + 1) == Some(&b'|') {
                    return Err(ParseError::Unsupported("||"));
                }
                segments.push(&line[start..i]);
                start = i + 1;
            }
            b'&' if !in_single && !in_double => {
                if bytes.get(i + 1) == Some(&b'&') {
                    return Err(ParseError::Unsupported("&&"));
                }
                background_at = Some(i);
            }
            _ => {}
        }
        i += 1;
    }

    if in_single || in_double {
        return Err(ParseError::UnbalancedQuotes);
    }

    let end = background_at.unwrap_or(line.len());
    segments.push(&line[start..end]);
    Ok((segments, background_at.is_some()))
}

/// Separates leading `NAME=value` words from the command words.
pub fn split_env_prefix(words: Vec<String>) -> (Vec<(String, String)>, Vec<String>) {
    let mut env = Vec::new();
    let mut rest = words.into_iter().peekable();

    while let Some(word) = rest.peek() {
        match crate::core::env::split_assignment(word) {
            Some((name, value)) if crate::core::env::is_valid_name(name) => {
                env.push((name.to_string(), value.to_string()));
                rest.next();
            }
            _ => break,
        }
    }
    (env, rest.collect())
}
