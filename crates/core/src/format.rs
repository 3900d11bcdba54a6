//! Formatting of generated modules.
//!
//! Every emitted module passes through a [`Formatter`] before it leaves the
//! compiler. A formatter that cannot make sense of its input reports a
//! [`FormatDiagnostic`]; the compiler turns that into a hard error.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::config::Lang;
use crate::naming::is_valid_identifier;

/// Fixed style handed to the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatStyle {
    /// Line width prettier wraps at.
    pub print_width: usize,
    /// Spaces per indentation level.
    pub tab_width: usize,
    /// Whether multi-line literals get a trailing comma.
    pub trailing_comma: bool,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            print_width: 120,
            tab_width: 2,
            trailing_comma: false,
        }
    }
}

/// Why a formatter rejected its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDiagnostic {
    /// Human-readable description of the problem.
    pub message: String,
    /// 1-based input line the problem was detected on.
    pub line: Option<usize>,
}

impl FormatDiagnostic {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for FormatDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A deterministic text to text pretty-printer.
pub trait Formatter: fmt::Debug {
    /// Format `source`, or explain why it cannot be formatted.
    fn format(&self, source: &str, lang: Lang, style: &FormatStyle) -> Result<String, FormatDiagnostic>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Paren,
    Bracket,
    Brace,
    /// `${ ... }` inside a template literal.
    Interp,
    /// Text of a template literal.
    Template,
}

impl Delim {
    fn open_char(self) -> char {
        match self {
            Delim::Paren => '(',
            Delim::Bracket => '[',
            Delim::Brace => '{',
            Delim::Interp => '$',
            Delim::Template => '`',
        }
    }

    fn closes(self, c: char) -> bool {
        matches!(
            (self, c),
            (Delim::Paren, ')') | (Delim::Bracket, ']') | (Delim::Brace | Delim::Interp, '}')
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    delim: Delim,
    line: usize,
    indent: usize,
}

/// Built-in formatter: checks delimiter, string and comment structure and
/// re-indents each line by nesting depth.
///
/// It does not re-wrap long lines; text inside template literals is kept
/// verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutFormatter;

#[derive(Debug, Default)]
struct Scanner {
    stack: Vec<Frame>,
    in_block_comment: bool,
}

impl Scanner {
    fn in_template(&self) -> bool {
        self.stack.last().is_some_and(|f| f.delim == Delim::Template)
    }

    /// Advance over one line. `indent` is the level the line was printed at.
    fn scan_line(&mut self, line: &str, line_no: usize, indent: usize) -> Result<(), FormatDiagnostic> {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    i += 1;
                }
                i += 1;
                continue;
            }

            if self.in_template() {
                match c {
                    '\\' => i += 1,
                    '`' => {
                        self.stack.pop();
                    }
                    '$' if next == Some('{') => {
                        self.stack.push(Frame { delim: Delim::Interp, line: line_no, indent });
                        i += 1;
                    }
                    _ => {}
                }
                i += 1;
                continue;
            }

            match c {
                '/' if next == Some('/') => break,
                '/' if next == Some('*') => {
                    self.in_block_comment = true;
                    i += 1;
                }
                '"' | '\'' => {
                    i += 1;
                    loop {
                        match chars.get(i) {
                            None => {
                                return Err(FormatDiagnostic::at(line_no, "unterminated string literal"));
                            }
                            Some('\\') => i += 1,
                            Some(&q) if q == c => break,
                            Some(_) => {}
                        }
                        i += 1;
                    }
                }
                '`' => self.stack.push(Frame { delim: Delim::Template, line: line_no, indent }),
                '(' => self.stack.push(Frame { delim: Delim::Paren, line: line_no, indent }),
                '[' => self.stack.push(Frame { delim: Delim::Bracket, line: line_no, indent }),
                '{' => self.stack.push(Frame { delim: Delim::Brace, line: line_no, indent }),
                ')' | ']' | '}' => match self.stack.pop() {
                    Some(frame) if frame.delim.closes(c) => {}
                    Some(frame) => {
                        return Err(FormatDiagnostic::at(
                            line_no,
                            format!(
                                "unexpected '{c}', '{}' opened on line {} is still open",
                                frame.delim.open_char(),
                                frame.line
                            ),
                        ));
                    }
                    None => {
                        return Err(FormatDiagnostic::at(line_no, format!("unexpected '{c}'")));
                    }
                },
                _ => {}
            }
            i += 1;
        }
        Ok(())
    }
}

fn leading_closers(trimmed: &str) -> usize {
    trimmed
        .chars()
        .take_while(|c| matches!(c, ')' | ']' | '}'))
        .count()
}

/// Name introduced by a declaration keyword at the start of `line`.
///
/// Destructuring patterns and comment lines introduce no checked name.
fn declared_name(line: &str) -> Option<&str> {
    if line.starts_with(['/', '*']) {
        return None;
    }
    let rest = line.strip_prefix("export ").unwrap_or(line);
    let rest = rest.strip_prefix("declare ").unwrap_or(rest);
    let after = ["interface ", "type ", "const ", "let ", "var ", "function ", "class "]
        .iter()
        .find_map(|keyword| rest.strip_prefix(keyword))?
        .trim_start();
    if after.starts_with(['{', '[']) {
        return None;
    }
    let end = after
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(after.len());
    Some(&after[..end])
}

impl Formatter for LayoutFormatter {
    fn format(&self, source: &str, _lang: Lang, style: &FormatStyle) -> Result<String, FormatDiagnostic> {
        let mut scanner = Scanner::default();
        let mut out: Vec<String> = Vec::new();
        let mut continuation = false;

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;

            if scanner.in_template() {
                out.push(line.to_string());
                scanner.scan_line(line, line_no, 0)?;
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                if out.last().is_some_and(|l| !l.is_empty()) {
                    out.push(String::new());
                }
                continue;
            }

            let level = if scanner.in_block_comment {
                scanner.stack.last().map_or(0, |f| f.indent + 1)
            } else {
                let closers = leading_closers(trimmed).min(scanner.stack.len());
                if closers > 0 {
                    scanner.stack[scanner.stack.len() - closers].indent
                } else {
                    scanner.stack.last().map_or(0, |f| f.indent + 1) + usize::from(continuation)
                }
            };

            let mut padding = " ".repeat(level * style.tab_width);
            if scanner.in_block_comment && trimmed.starts_with('*') {
                padding.push(' ');
            }

            let starts_in_comment = scanner.in_block_comment;
            if !starts_in_comment
                && let Some(name) = declared_name(trimmed)
                && !is_valid_identifier(name)
            {
                return Err(FormatDiagnostic::at(line_no, format!("invalid identifier '{name}'")));
            }
            scanner.scan_line(trimmed, line_no, level)?;
            out.push(format!("{padding}{trimmed}"));

            if !starts_in_comment && !trimmed.starts_with("//") && !trimmed.starts_with("/*") {
                continuation = trimmed.ends_with("=>");
            }
        }

        if let Some(frame) = scanner.stack.last() {
            let what = match frame.delim {
                Delim::Template => "unterminated template literal".to_string(),
                other => format!("unclosed '{}'", other.open_char()),
            };
            return Err(FormatDiagnostic::at(frame.line, what));
        }
        if scanner.in_block_comment {
            return Err(FormatDiagnostic {
                message: "unterminated block comment".to_string(),
                line: None,
            });
        }

        while out.last().is_some_and(String::is_empty) {
            out.pop();
        }
        let mut text = out.join("\n");
        text.push('\n');
        Ok(text)
    }
}

/// Runs an installed `prettier` over each module.
#[derive(Debug, Clone)]
pub struct PrettierFormatter {
    program: PathBuf,
    prefix_args: Vec<String>,
}

impl PrettierFormatter {
    /// Locate `prettier` on `PATH`, falling back to `npx prettier`.
    pub fn detect() -> Option<Self> {
        if let Ok(program) = which::which("prettier") {
            return Some(Self {
                program,
                prefix_args: Vec::new(),
            });
        }
        which::which("npx").ok().map(|program| Self {
            program,
            prefix_args: vec!["--no-install".to_string(), "prettier".to_string()],
        })
    }

    fn args(&self, lang: Lang, style: &FormatStyle) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend([
            "--parser".to_string(),
            lang.parser().to_string(),
            "--print-width".to_string(),
            style.print_width.to_string(),
            "--tab-width".to_string(),
            style.tab_width.to_string(),
            "--trailing-comma".to_string(),
            if style.trailing_comma { "all" } else { "none" }.to_string(),
        ]);
        args
    }
}

/// Extract the line of a prettier `(line:column)` error location.
fn prettier_error_line(stderr: &str) -> Option<usize> {
    let open = stderr.find('(')?;
    let rest = &stderr[open + 1..];
    let (line, rest) = rest.split_once(':')?;
    let (col, _) = rest.split_once(')')?;
    col.trim().parse::<usize>().ok()?;
    line.trim().parse().ok()
}

impl Formatter for PrettierFormatter {
    fn format(&self, source: &str, lang: Lang, style: &FormatStyle) -> Result<String, FormatDiagnostic> {
        let spawn_err = |e: std::io::Error| FormatDiagnostic {
            message: format!("failed to run {}: {e}", self.program.display()),
            line: None,
        };
        let mut child = Command::new(&self.program)
            .args(self.args(lang, style))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FormatDiagnostic {
            message: stderr.lines().next().unwrap_or("prettier failed").trim().to_string(),
            line: prettier_error_line(&stderr),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn layout(src: &str) -> Result<String, FormatDiagnostic> {
        LayoutFormatter.format(src, Lang::Ts, &FormatStyle::default())
    }

    #[test]
    fn test_reindents_by_depth() {
        let src = "export interface Pet {\nid: number;\n      name?: string;\n}\n";
        assert_eq!(
            layout(src).unwrap(),
            "export interface Pet {\n  id: number;\n  name?: string;\n}\n"
        );
    }

    #[test]
    fn test_arrow_continuation() {
        let src = "export const f = (params: { a: string }) =>\naxios.request({\nurl: `/a`,\nmethod: \"get\"\n});\n";
        assert_eq!(
            layout(src).unwrap(),
            "export const f = (params: { a: string }) =>\n  axios.request({\n    url: `/a`,\n    method: \"get\"\n  });\n"
        );
    }

    #[test]
    fn test_collapses_blank_lines_and_keeps_doc_comments() {
        let src = "\n\n/**\n* Pet\n */\n\n\n\nexport type A = string;\n\n";
        assert_eq!(layout(src).unwrap(), "/**\n * Pet\n */\n\nexport type A = string;\n");
    }

    #[test]
    fn test_template_literal_lines_are_verbatim() {
        let src = "const s = `line one\n   keep   ${value}\n`;\n";
        assert_eq!(layout(src).unwrap(), src);
    }

    #[test]
    fn test_idempotent() {
        let src = "export const f = (a: { b: number }) => {\n  const x = [1, 2];\n  return x;\n};\n";
        let once = layout(src).unwrap();
        assert_eq!(layout(&once).unwrap(), once);
    }

    #[test]
    fn test_reports_structural_errors() {
        let err = layout("const a = (1;\nconst b = 2;\n").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert!(err.message.contains("unclosed '('"));

        let err = layout("const a = 1;\nfoo(]);\n").unwrap_err();
        assert_eq!(err.line, Some(2));

        let err = layout("const a = \"open;\n").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert!(err.message.contains("unterminated string"));

        let err = layout("const a = `never closed\n").unwrap_err();
        assert!(err.message.contains("template literal"));
    }

    #[test]
    fn test_rejects_declarations_with_illegal_names() {
        let err = layout("/* eslint-disable */\nexport interface 1Foo {\n  id: number;\n}\n").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("invalid identifier '1Foo'"), "{err}");

        let err = layout("export type default = string;\n").unwrap_err();
        assert!(err.message.contains("'default'"), "{err}");

        let err = layout("const = 1;\n").unwrap_err();
        assert!(err.message.contains("invalid identifier ''"), "{err}");

        let ok = "/**\n * type 1Foo\n */\n// const default\nconst { a } = b;\nexport type _1Foo = string;\n";
        assert!(layout(ok).is_ok());
    }

    #[test]
    fn test_ignores_delimiters_in_strings_and_comments() {
        let src = "const a = \"({[\"; // )\n/* } */\nconst b = '`';\n";
        assert!(layout(src).is_ok());
    }

    #[test]
    fn test_prettier_error_line() {
        let stderr = "[error] stdin: SyntaxError: ';' expected. (3:15)\n[error]   1 | ...";
        assert_eq!(prettier_error_line(stderr), Some(3));
        assert_eq!(prettier_error_line("no location"), None);
    }

    #[test]
    fn test_prettier_args() {
        let formatter = PrettierFormatter {
            program: PathBuf::from("prettier"),
            prefix_args: Vec::new(),
        };
        let args = formatter.args(Lang::Js, &FormatStyle::default());
        assert_eq!(
            args,
            vec![
                "--parser",
                "babel",
                "--print-width",
                "120",
                "--tab-width",
                "2",
                "--trailing-comma",
                "none"
            ]
        );
    }
}
