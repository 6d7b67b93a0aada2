use inksac::prelude::*;

use crate::core::commands::is_builtin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Command,
    Builtin,
    Flag,
    Operator,
    Plain,
}

#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    fn enabled(&self) -> bool {
        !matches!(self.color_support, ColorSupport::NoColor)
    }

    /// Colours each word of the line without changing its spacing.
    pub fn highlight_command(&self, input: &str) -> String {
        if !self.enabled() {
            return input.to_string();
        }

        let mut out = String::with_capacity(input.len() * 2);
        for (word, token) in classify(input) {
            match token {
                Token::Plain => out.push_str(word),
                _ => out.push_str(&word.style(style_for(token)).to_string()),
            }
        }
        out
    }

    pub fn highlight_hint(&self, hint: &str) -> String {
        if !self.enabled() {
            return hint.to_string();
        }

        let hint_style = Style::builder()
            .foreground(Color::RGB(128, 128, 128))
            .build();

        hint.style(hint_style).to_string()
    }
}

fn style_for(token: Token) -> Style {
    match token {
        Token::Command => Style::builder().foreground(Color::Cyan).bold().build(),
        Token::Builtin => Style::builder().foreground(Color::Magenta).bold().build(),
        Token::Flag => Style::builder().foreground(Color::Yellow).build(),
        Token::Operator => Style::builder().foreground(Color::Green).bold().build(),
        Token::Plain => Style::builder().build(),
    }
}

/// Splits `input` into runs of whitespace and words, classifying each word.
/// Concatenating the returned slices yields `input` unchanged.
fn classify(input: &str) -> Vec<(&str, Token)> {
    let mut pieces = Vec::new();
    let mut expect_command = true;
    let mut rest = input;

    while !rest.is_empty() {
        let is_space = rest.starts_with(char::is_whitespace);
        let end = rest
            .find(|c: char| c.is_whitespace() != is_space)
            .unwrap_or(rest.len());
        let (word, tail) = rest.split_at(end);
        rest = tail;

        let token = if is_space {
            Token::Plain
        } else if word == "|" || word == "&" {
            expect_command = word == "|";
            Token::Operator
        } else if expect_command {
            expect_command = false;
            if is_builtin(word) {
                Token::Builtin
            } else {
                Token::Command
            }
        } else if word.starts_with('-') {
            Token::Flag
        } else {
            Token::Plain
        };
        pieces.push((word, token));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        classify(input)
            .into_iter()
            .filter(|(word, _)| !word.trim().is_empty())
            .map(|(_, token)| token)
            .collect()
    }

    #[test]
    fn test_classify_pipeline() {
        assert_eq!(
            tokens("ls -l | grep x &"),
            vec![
                Token::Command,
                Token::Flag,
                Token::Operator,
                Token::Command,
                Token::Plain,
                Token::Operator
            ]
        );
    }

    #[test]
    fn test_builtins_are_distinct() {
        assert_eq!(tokens("cd /tmp"), vec![Token::Builtin, Token::Plain]);
    }

    #[test]
    fn test_spacing_preserved() {
        let input = "  echo   a |  cat ";
        let rebuilt: String = classify(input).into_iter().map(|(w, _)| w).collect();
        assert_eq!(rebuilt, input);
    }
}
