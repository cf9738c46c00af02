//! Deterministic re-indentation of brace-structured source text.
//!
//! Indentation is derived purely from bracket nesting, so running the
//! formatter on its own output changes nothing.

use crate::error::{Error, Result};
use crate::format::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalFormatter {
    indent_width: usize,
}

impl CanonicalFormatter {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }
}

impl Transform for CanonicalFormatter {
    fn transform(&self, generated: &str, _previous: Option<&str>) -> Result<String> {
        let text = generated.replace("\r\n", "\n");
        let mut scanner = Scanner::default();
        let mut lines: Vec<Line> = Vec::new();

        for (index, raw) in text.split('\n').enumerate() {
            let number = index + 1;

            // Inside a multi-line string literal every byte is significant.
            if scanner.state == State::Str {
                scanner.scan_line(raw, number)?;
                lines.push(Line { text: raw.to_string(), verbatim: true });
                continue;
            }

            let content = raw.trim_start();
            if content.trim_end().is_empty() {
                lines.push(Line { text: String::new(), verbatim: false });
                continue;
            }

            let in_comment = scanner.state == State::BlockComment;
            let closers = if in_comment { 0 } else { leading_closers(content) };
            let depth = scanner.depth().saturating_sub(closers);

            scanner.scan_line(content, number)?;
            let content = if scanner.state == State::Str { content } else { content.trim_end() };

            let mut line = " ".repeat(depth * self.indent_width);
            if in_comment && content.starts_with('*') {
                line.push(' ');
            }
            line.push_str(content);
            lines.push(Line { text: line, verbatim: false });
        }

        scanner.finish(text.split('\n').count())?;
        Ok(join_collapsed(lines))
    }
}

struct Line {
    text: String,
    verbatim: bool,
}

/// Joins lines, dropping leading, trailing and repeated blank lines.
fn join_collapsed(lines: Vec<Line>) -> String {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut previous_blank = true;
    for line in lines {
        let blank = !line.verbatim && line.text.is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        out.push(line.text);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    if out.is_empty() {
        return String::new();
    }
    let mut joined = out.join("\n");
    joined.push('\n');
    joined
}

fn leading_closers(content: &str) -> usize {
    content.chars().take_while(|c| matches!(c, '}' | ')' | ']')).count()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Code,
    Str,
    BlockComment,
}

/// Tracks bracket nesting across lines, skipping strings, chars and comments.
#[derive(Debug, Default)]
struct Scanner {
    stack: Vec<(char, usize)>,
    state: State,
    string_line: usize,
}

impl Scanner {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn scan_line(&mut self, line: &str, number: usize) -> Result<()> {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            match self.state {
                State::BlockComment => {
                    if c == '*' && next == Some('/') {
                        self.state = State::Code;
                        i += 1;
                    }
                }
                State::Str => match c {
                    '\\' => i += 1,
                    '"' => self.state = State::Code,
                    _ => {}
                },
                State::Code => match c {
                    '/' if next == Some('/') => return Ok(()),
                    '/' if next == Some('*') => {
                        self.state = State::BlockComment;
                        i += 1;
                    }
                    '"' => {
                        self.state = State::Str;
                        self.string_line = number;
                    }
                    '\'' => i += char_literal_len(&chars[i..]) - 1,
                    '{' | '(' | '[' => self.stack.push((c, number)),
                    '}' | ')' | ']' => match self.stack.pop() {
                        Some((open, _)) if matches_pair(open, c) => {}
                        _ => return Err(Error::UnbalancedDelimiter { line: number, delimiter: c }),
                    },
                    _ => {}
                },
            }
            i += 1;
        }
        Ok(())
    }

    fn finish(&self, last_line: usize) -> Result<()> {
        if self.state == State::Str {
            return Err(Error::UnbalancedDelimiter {
                line: self.string_line.max(1).min(last_line),
                delimiter: '"',
            });
        }
        match self.stack.last() {
            Some(&(delimiter, line)) => Err(Error::UnbalancedDelimiter { line, delimiter }),
            None => Ok(()),
        }
    }
}

fn matches_pair(open: char, close: char) -> bool {
    matches!((open, close), ('{', '}') | ('(', ')') | ('[', ']'))
}

/// Length of a char literal starting at `chars[0] == '\''`, or 1 for a lifetime or label.
fn char_literal_len(chars: &[char]) -> usize {
    match chars.get(1) {
        Some('\\') => chars
            .iter()
            .skip(3)
            .position(|&c| c == '\'')
            .map_or(1, |offset| offset + 4),
        Some(_) if chars.get(2) == Some(&'\'') => 3,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(text: &str) -> String {
        CanonicalFormatter::new(4).transform(text, None).unwrap()
    }

    #[test]
    fn indents_by_nesting_depth() {
        let input = "fn main() {\nlet v = vec![\n1,\n2,\n];\nif true {\nrun();\n}\n}";
        let expected = "fn main() {\n    let v = vec![\n        1,\n        2,\n    ];\n    if true {\n        run();\n    }\n}\n";
        assert_eq!(format(input), expected);
    }

    #[test]
    fn collapses_blank_lines_and_trailing_whitespace() {
        let input = "\n\nstruct A;   \n\n\n\nstruct B;\t\n\n";
        assert_eq!(format(input), "struct A;\n\nstruct B;\n");
    }

    #[test]
    fn ignores_brackets_in_strings_chars_and_comments() {
        let input = "fn f() {\nlet s = \"{[(\";\nlet c = '{';\nlet e = '\\'';\n// }\n/* ) */\nx\n}";
        let expected = "fn f() {\n    let s = \"{[(\";\n    let c = '{';\n    let e = '\\'';\n    // }\n    /* ) */\n    x\n}\n";
        assert_eq!(format(input), expected);
    }

    #[test]
    fn lifetimes_are_not_char_literals() {
        let input = "struct S<'a> {\nr: &'a str,\n}";
        assert_eq!(format(input), "struct S<'a> {\n    r: &'a str,\n}\n");
    }

    #[test]
    fn multi_line_strings_are_left_alone() {
        let input = "fn f() {\nlet s = \"first\n   second  \n\n\nthird\";\n}";
        let expected = "fn f() {\n    let s = \"first\n   second  \n\n\nthird\";\n}\n";
        assert_eq!(format(input), expected);
    }

    #[test]
    fn block_comment_continuations_are_aligned() {
        let input = "mod m {\n/**\n* Docs.\n*/\nfn f() {}\n}";
        let expected = "mod m {\n    /**\n     * Docs.\n     */\n    fn f() {}\n}\n";
        assert_eq!(format(input), expected);
    }

    #[test]
    fn is_idempotent() {
        let input = "impl A {\n  fn a(&self) -> u8 {\n\n\n match x { 1 => 2, _ => {\n3 } }\n }\n}\n";
        let once = format(input);
        assert_eq!(format(&once), once);
    }

    #[test]
    fn respects_indent_width() {
        let out = CanonicalFormatter::new(2).transform("a {\nb\n}", None).unwrap();
        assert_eq!(out, "a {\n  b\n}\n");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(format(""), "");
        assert_eq!(format("\n \n"), "");
    }

    #[test]
    fn reports_unbalanced_delimiters() {
        let formatter = CanonicalFormatter::new(4);
        assert!(matches!(
            formatter.transform("a {\n}\n}", None),
            Err(Error::UnbalancedDelimiter { line: 3, delimiter: '}' })
        ));
        assert!(matches!(
            formatter.transform("a (\n]", None),
            Err(Error::UnbalancedDelimiter { line: 2, delimiter: ']' })
        ));
        assert!(matches!(
            formatter.transform("x\nfn f() {\n", None),
            Err(Error::UnbalancedDelimiter { line: 2, delimiter: '{' })
        ));
        assert!(matches!(
            formatter.transform("let s = \"open", None),
            Err(Error::UnbalancedDelimiter { line: 1, delimiter: '"' })
        ));
    }
}
