// INI reader - parses [section] / key=value files into an ordered, read-only source

use super::ConfigError;
use std::path::Path;

/// One `[section]` of an INI file, keys kept in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a key, ignoring ASCII case
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, key: String, value: String, line: usize) -> Result<(), ConfigError> {
        if self.contains_key(&key) {
            return Err(ConfigError::Parse {
                line,
                message: format!("duplicate key '{}' in section [{}]", key, self.name),
            });
        }
        self.entries.push((key, value));
        Ok(())
    }
}

/// Parsed INI file. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSource {
    sections: Vec<Section>,
}

impl ConfigSource {
    /// Read and parse an INI file. A missing file is `ConfigError::NotFound`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Self::parse(&content)?;
        tracing::debug!(
            "Loaded config file {:?} ({} sections)",
            path,
            source.sections.len()
        );
        Ok(source)
    }

    /// Parse INI text. Any malformed line fails the whole file.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut sections: Vec<Section> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();

            // Skip comments and empty lines
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') {
                if !trimmed.ends_with(']') {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        message: format!("unterminated section header '{}'", trimmed),
                    });
                }
                let name = trimmed[1..trimmed.len() - 1].trim();
                if name.is_empty() {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        message: "empty section name".to_string(),
                    });
                }
                if sections.iter().any(|s| s.name == name) {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        message: format!("duplicate section [{}]", name),
                    });
                }
                sections.push(Section::new(name));
                continue;
            }

            let (key, value) = split_entry(trimmed, line_no)?;
            let section = sections.last_mut().ok_or_else(|| ConfigError::Parse {
                line: line_no,
                message: format!("key '{}' appears before any [section] header", key),
            })?;
            section.insert(key, value, line_no)?;
        }

        Ok(Self { sections })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Like [`ConfigSource::section`] but absence is an error
    pub fn require_section(&self, name: &str) -> Result<&Section, ConfigError> {
        self.section(name)
            .ok_or_else(|| ConfigError::MissingSection(name.to_string()))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

/// Parse sectionless `KEY=VALUE` text (a `.env` file).
/// Supports an optional `export ` prefix and strips matching outer quotes.
pub fn parse_properties(content: &str) -> Result<Section, ConfigError> {
    let mut section = Section::new("");

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();
        let eq_pos = trimmed.find('=').ok_or_else(|| ConfigError::Parse {
            line: line_no,
            message: format!("expected KEY=VALUE, found '{}'", trimmed),
        })?;

        let key = trimmed[..eq_pos].trim();
        if key.is_empty() {
            return Err(ConfigError::Parse {
                line: line_no,
                message: "empty key".to_string(),
            });
        }
        let value = unquote(trimmed[eq_pos + 1..].trim());

        // Later assignments win, matching shell semantics
        section.entries.retain(|(k, _)| k != key);
        section.entries.push((key.to_string(), value.to_string()));
    }

    Ok(section)
}

fn split_entry(line: &str, line_no: usize) -> Result<(String, String), ConfigError> {
    let pos = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| ConfigError::Parse {
        line: line_no,
        message: format!("expected 'key = value', found '{}'", line),
    })?;

    let key = line[..pos].trim();
    if key.is_empty() {
        return Err(ConfigError::Parse {
            line: line_no,
            message: "empty key".to_string(),
        });
    }

    Ok((key.to_string(), line[pos + 1..].trim().to_string()))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# launcher config
[Server Configuration]
ExecutablePath = server.exe
WorkingDirectory: C:\\srv

; game settings
[Server Settings]
Port=28960
Map = dust
";

    #[test]
    fn test_parse_sections_in_order() {
        let source = ConfigSource::parse(SAMPLE).unwrap();
        let names: Vec<&str> = source.sections().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Server Configuration", "Server Settings"]);

        let settings = source.section("Server Settings").unwrap();
        let keys: Vec<&str> = settings.keys().collect();
        assert_eq!(keys, vec!["Port", "Map"]);
    }

    #[test]
    fn test_colon_delimiter_and_case_insensitive_keys() {
        let source = ConfigSource::parse(SAMPLE).unwrap();
        assert_eq!(source.get("Server Configuration", "WorkingDirectory"), Some("C:\\srv"));
        assert_eq!(source.get("Server Configuration", "executablepath"), Some("server.exe"));
        assert_eq!(source.get("server configuration", "ExecutablePath"), None);
    }

    #[test]
    fn test_empty_value_is_kept() {
        let source = ConfigSource::parse("[A]\nkey =\n").unwrap();
        assert_eq!(source.get("A", "key"), Some(""));
    }

    #[test]
    fn test_key_before_section_is_error() {
        let err = ConfigSource::parse("Port=1\n[A]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_line_without_delimiter_is_error() {
        let err = ConfigSource::parse("[A]\n\nnot a pair\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_duplicates_are_errors() {
        let err = ConfigSource::parse("[A]\n[A]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = ConfigSource::parse("[A]\nPort=1\nport=2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_require_section() {
        let source = ConfigSource::parse(SAMPLE).unwrap();
        assert!(source.require_section("Server Settings").is_ok());
        let err = source.require_section("Setup").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(name) if name == "Setup"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigSource::load(&dir.path().join("config.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_properties_parsing() {
        let content = "# env\nSERVER_PATH=\"C:\\games\\server.exe\"\nexport SERVER_PORT = 30000\nBRANCH='community'\nSERVER_PORT=30001\n";
        let section = parse_properties(content).unwrap();
        assert_eq!(section.get("SERVER_PATH"), Some("C:\\games\\server.exe"));
        assert_eq!(section.get("SERVER_PORT"), Some("30001"));
        assert_eq!(section.get("BRANCH"), Some("community"));
        assert_eq!(section.len(), 3);
    }
}
