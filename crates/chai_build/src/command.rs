//! Positional command templates.
//!
//! Every toolchain invocation is a template with `{}` placeholders that are
//! filled left to right, one argument each. [`format`] is the lenient form and
//! leaves unmatched placeholders in place; [`CommandTemplate::render`] checks
//! the counts first and refuses to build a malformed command.

use std::fmt;

/// The placeholder marker replaced by one argument.
pub const PLACEHOLDER: &str = "{}";

/// Substitutes `args` into `template`, one placeholder per argument, left to right.
///
/// Substitution stops when either side runs out: surplus placeholders stay in
/// the output verbatim and surplus arguments are dropped. Text inserted from an
/// argument is never rescanned for placeholders.
pub fn format<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    for arg in args {
        let Some(at) = rest.find(PLACEHOLDER) else {
            break;
        };
        out.push_str(&rest[..at]);
        out.push_str(arg.as_ref());
        rest = &rest[at + PLACEHOLDER.len()..];
    }
    out.push_str(rest);
    out
}

/// Errors from strict template rendering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The number of arguments does not match the number of placeholders.
    #[error("template `{template}` expects {expected} arguments, got {given}")]
    ArgumentCount {
        /// The template text.
        template: String,
        /// Placeholders in the template.
        expected: usize,
        /// Arguments supplied.
        given: usize,
    },
}

/// A command line with ordered `{}` placeholders.
///
/// Built either from raw text with [`CommandTemplate::new`] or word by word:
///
/// ```
/// use chai_build::CommandTemplate;
///
/// let t = CommandTemplate::program("c++")
///     .arg("-c")
///     .prefixed("-I", ["include"])
///     .placeholder()
///     .arg("-o")
///     .placeholder();
/// assert_eq!(t.as_str(), "c++ -c -Iinclude {} -o {}");
/// assert_eq!(t.render(&["a.cpp", "a.o"]).unwrap(), "c++ -c -Iinclude a.cpp -o a.o");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    text: String,
}

impl CommandTemplate {
    /// Wraps raw template text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Starts a template with the program to invoke.
    pub fn program(program: &str) -> Self {
        Self::new(program)
    }

    /// Appends one word. Empty words are skipped.
    pub fn arg(mut self, word: &str) -> Self {
        if !word.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(word);
        }
        self
    }

    /// Appends each word in order.
    pub fn args<I, S>(self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words.into_iter().fold(self, |t, w| t.arg(w.as_ref()))
    }

    /// Appends each word with `prefix` glued on, e.g. `-I` or `-l`.
    pub fn prefixed<I, S>(self, prefix: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words.into_iter().fold(self, |t, w| {
            let w = w.as_ref();
            if w.is_empty() {
                t
            } else {
                t.arg(&std::format!("{prefix}{w}"))
            }
        })
    }

    /// Appends a placeholder word.
    pub fn placeholder(self) -> Self {
        self.arg(PLACEHOLDER)
    }

    /// Number of placeholders in the template.
    pub fn placeholders(&self) -> usize {
        self.text.matches(PLACEHOLDER).count()
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Fills every placeholder, failing if the argument count differs.
    pub fn render<S: AsRef<str>>(&self, args: &[S]) -> Result<String, TemplateError> {
        let expected = self.placeholders();
        if expected != args.len() {
            return Err(TemplateError::ArgumentCount {
                template: self.text.clone(),
                expected,
                given: args.len(),
            });
        }
        Ok(format(&self.text, args))
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
