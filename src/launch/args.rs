// Argument builder - turns configuration settings into `-key=value` flags

use super::LaunchError;
use crate::config::{ConfigError, ConfigSource, EnvSource, Section};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Anything settings can be read from by name
pub trait SettingLookup {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl SettingLookup for Section {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl SettingLookup for EnvSource {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

/// How a configuration key is rewritten into a flag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    #[default]
    Verbatim,
    /// Drop the namespace token before the first separator, then remove the
    /// remaining separators: `SERVER_MAX_PLAYERS` -> `MAXPLAYERS`
    StripPrefix { separator: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    #[default]
    Preserve,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyTransform {
    pub style: KeyStyle,
    pub case: KeyCase,
}

impl KeyTransform {
    pub fn apply(&self, key: &str) -> String {
        let name = match self.style {
            KeyStyle::Verbatim => key.to_string(),
            KeyStyle::StripPrefix { separator } => {
                let rest = key
                    .split_once(separator)
                    .map(|(_, rest)| rest)
                    .unwrap_or(key);
                rest.chars().filter(|c| *c != separator).collect()
            }
        };

        match self.case {
            KeyCase::Preserve => name,
            KeyCase::Lower => name.to_lowercase(),
        }
    }
}

/// Ordered list of variable names to turn into flags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentSpec {
    names: Vec<String>,
}

impl ArgumentSpec {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentBuilder {
    transform: KeyTransform,
    excluded: Vec<String>,
}

impl ArgumentBuilder {
    pub fn new(transform: KeyTransform) -> Self {
        Self {
            transform,
            excluded: Vec::new(),
        }
    }

    /// Skip `key` (ASCII case-insensitive); used for values consumed elsewhere
    pub fn exclude(mut self, key: &str) -> Self {
        self.excluded.push(key.to_string());
        self
    }

    /// Section mode: one flag per key present in `section`, in file order
    pub fn flags_from_section(
        &self,
        source: &ConfigSource,
        section: &str,
    ) -> Result<Vec<String>, ConfigError> {
        let section = source.require_section(section)?;
        Ok(section
            .entries()
            .filter_map(|(key, value)| self.flag(key, Some(value)))
            .collect())
    }

    /// Declared mode: one flag per name in `spec`, in declaration order
    pub fn flags_from_spec(&self, spec: &ArgumentSpec, settings: &impl SettingLookup) -> Vec<String> {
        spec.names()
            .iter()
            .filter_map(|name| self.flag(name, settings.lookup(name)))
            .collect()
    }

    fn flag(&self, key: &str, value: Option<&str>) -> Option<String> {
        if self.excluded.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            return None;
        }

        match value.map(str::trim) {
            Some(value) if !value.is_empty() => {
                Some(format!("-{}={}", self.transform.apply(key), value))
            }
            _ => {
                tracing::debug!("Setting '{}' is unset, omitting flag", key);
                None
            }
        }
    }
}

/// `[program, fixed..., flags...]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    program: String,
    fixed: Vec<String>,
    flags: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Result<Self, LaunchError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(LaunchError::EmptyProgram);
        }

        Ok(Self {
            program,
            fixed: Vec::new(),
            flags: Vec::new(),
        })
    }

    pub fn from_path(program: &Path) -> Result<Self, LaunchError> {
        Self::new(program.to_string_lossy())
    }

    pub fn fixed<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixed.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn flags(mut self, flags: Vec<String>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Fails when no generated flags were produced
    pub fn require_flags(self) -> Result<Self, LaunchError> {
        if self.flags.is_empty() {
            return Err(LaunchError::EmptyCommandLine);
        }
        Ok(self)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn generated_flags(&self) -> &[String] {
        &self.flags
    }

    /// Everything after the program
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.fixed.iter().chain(self.flags.iter()).map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        std::iter::once(self.program.as_str())
            .chain(self.args())
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_words::join(self.to_vec()))
    }
}
