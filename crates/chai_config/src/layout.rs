//! The project layout: named fields mapped to ordered string lists.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;

/// A named field of a [`ProjectLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutField {
    /// Compiler driver used for expansion, compilation and linking.
    Compiler,
    /// Debugger launched by `chai debug`.
    Debugger,
    /// Flags passed to every toolchain invocation.
    CompileFlags,
    /// Extra flags for the macro-expansion (fingerprint) stage only.
    HashFlags,
    /// Extra flags for the compile-to-object stage only.
    ObjectFlags,
    /// Header search directories.
    Headers,
    /// Libraries to link against.
    Libraries,
    /// Source files or directories to compile.
    Sources,
    /// Language standard, e.g. `c++17`.
    Standard,
    /// Number of compile workers.
    Threads,
}

impl LayoutField {
    /// Every field, in storage-key order.
    pub const ALL: [LayoutField; 10] = [
        LayoutField::CompileFlags,
        LayoutField::Compiler,
        LayoutField::Debugger,
        LayoutField::HashFlags,
        LayoutField::Headers,
        LayoutField::Libraries,
        LayoutField::ObjectFlags,
        LayoutField::Sources,
        LayoutField::Standard,
        LayoutField::Threads,
    ];

    /// The key under which this field is stored.
    pub fn key(self) -> &'static str {
        match self {
            LayoutField::Compiler => "compiler",
            LayoutField::Debugger => "debugger",
            LayoutField::CompileFlags => "compile_flags",
            LayoutField::HashFlags => "hash_flags",
            LayoutField::ObjectFlags => "object_flags",
            LayoutField::Headers => "headers",
            LayoutField::Libraries => "libraries",
            LayoutField::Sources => "sources",
            LayoutField::Standard => "standard",
            LayoutField::Threads => "threads",
        }
    }

    /// Returns `true` for fields that hold exactly one value.
    pub fn is_single(self) -> bool {
        matches!(
            self,
            LayoutField::Compiler
                | LayoutField::Debugger
                | LayoutField::Standard
                | LayoutField::Threads
        )
    }
}

impl fmt::Display for LayoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A project's settings as ordered string lists keyed by field name.
///
/// Keys that are not a [`LayoutField`] are kept as-is so that rewriting a
/// layout never drops settings this version does not understand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectLayout {
    fields: BTreeMap<String, Vec<String>>,
}

impl ProjectLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// The layout written by `init` and `reset`.
    pub fn default_for_new_project() -> Self {
        let mut layout = Self::new();
        for field in LayoutField::ALL {
            layout.fields.insert(field.key().to_string(), Vec::new());
        }
        layout.put(LayoutField::Compiler, "c++");
        layout.put(LayoutField::Debugger, "gdb");
        layout.put(LayoutField::Standard, "c++17");
        layout.put(LayoutField::Threads, "4");
        layout
    }

    /// Builds a layout from stored `key -> "space separated values"` entries.
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        let fields = entries
            .into_iter()
            .map(|(key, value)| (key, split_values(&value)))
            .collect();
        Self { fields }
    }

    /// Flattens the layout back into `key -> "space separated values"` entries.
    pub fn to_entries(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(key, values)| (key.clone(), values.join(" ")))
            .collect()
    }

    /// Iterates over every stored key and its values, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the values of `field`, or an empty slice if it is not stored.
    pub fn get(&self, field: LayoutField) -> &[String] {
        self.get_key(field.key()).unwrap_or(&[])
    }

    /// Returns the values stored under an arbitrary key.
    pub fn get_key(&self, key: &str) -> Option<&[String]> {
        self.fields.get(key).map(Vec::as_slice)
    }

    /// Returns the single value of `field`.
    ///
    /// An absent or empty field is [`ConfigError::MissingField`]; more than one
    /// value is a validation error.
    pub fn single(&self, field: LayoutField) -> Result<&str, ConfigError> {
        match self.get(field) {
            [value] => Ok(value.as_str()),
            [] => Err(ConfigError::MissingField(field.key().to_string())),
            values => Err(ConfigError::ValidationError(format!(
                "{field} must have exactly one value, found {}",
                values.len()
            ))),
        }
    }

    /// The compiler driver.
    pub fn compiler(&self) -> Result<&str, ConfigError> {
        self.single(LayoutField::Compiler)
    }

    /// The debugger program.
    pub fn debugger(&self) -> Result<&str, ConfigError> {
        self.single(LayoutField::Debugger)
    }

    /// The language standard.
    pub fn standard(&self) -> Result<&str, ConfigError> {
        self.single(LayoutField::Standard)
    }

    /// The number of compile workers, at least one.
    pub fn threads(&self) -> Result<usize, ConfigError> {
        parse_threads(self.single(LayoutField::Threads)?)
    }

    /// Checks every field the build engine requires.
    pub fn validate_for_build(&self) -> Result<(), ConfigError> {
        self.compiler()?;
        self.standard()?;
        self.threads()?;
        Ok(())
    }

    /// Appends the whitespace-separated items of `value` to a list field.
    pub fn push(&mut self, field: LayoutField, value: &str) -> Result<(), ConfigError> {
        if field.is_single() {
            return Err(ConfigError::ValidationError(format!(
                "{field} holds a single value; set it instead"
            )));
        }
        let items = split_values(value);
        if items.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "refusing to add an empty value to {field}"
            )));
        }
        self.fields
            .entry(field.key().to_string())
            .or_default()
            .extend(items);
        Ok(())
    }

    /// Removes the first occurrence of `value` from a field.
    pub fn remove(&mut self, field: LayoutField, value: &str) -> Result<(), ConfigError> {
        let not_found = || ConfigError::ValueNotFound {
            field: field.key().to_string(),
            value: value.to_string(),
        };
        let values = self.fields.get_mut(field.key()).ok_or_else(not_found)?;
        let index = values.iter().position(|v| v == value).ok_or_else(not_found)?;
        values.remove(index);
        Ok(())
    }

    /// Replaces a single-value field.
    pub fn set(&mut self, field: LayoutField, value: &str) -> Result<(), ConfigError> {
        if !field.is_single() {
            return Err(ConfigError::ValidationError(format!(
                "{field} is a list; add or remove values instead"
            )));
        }
        let value = value.trim();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be a single word, got '{value}'"
            )));
        }
        if field == LayoutField::Threads {
            parse_threads(value)?;
        }
        self.put(field, value);
        Ok(())
    }

    fn put(&mut self, field: LayoutField, value: &str) {
        self.fields
            .insert(field.key().to_string(), vec![value.to_string()]);
    }
}

fn split_values(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn parse_threads(value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::ValidationError(format!(
            "threads must be a positive integer, got '{value}'"
        ))),
    }
}
