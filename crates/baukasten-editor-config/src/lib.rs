use baukasten_editor_engine::{
    EngineError,
    editing::{DecoratorRule, EditorOptions, Suggestion, TriggerDefinition},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read initial content from {path}: {source}")]
    InitialFileError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid trigger #{index}: {source}")]
    InvalidTrigger { index: usize, source: EngineError },

    #[error("Invalid decorator #{index}: {source}")]
    InvalidDecorator { index: usize, source: EngineError },
}

/// Editor configuration as stored in `config.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub disabled: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    /// File whose contents seed the editor when `initial_value` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_file: Option<PathBuf>,
    pub triggers: Vec<TriggerConfig>,
    pub decorators: Vec<DecoratorConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub trigger: String,
    /// Key of the suggestion `data` used as the serialized mention value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialize_field: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<SuggestionConfig>,
}

/// A suggestion as written in `config.toml`.
///
/// `data` is either an inline table or a string holding JSON. A payload that
/// does not convert to JSON is dropped with a warning; the suggestion itself
/// is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecoratorConfig {
    pub pattern: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.initial_file = config
            .initial_file
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        log::debug!(
            "loaded config from {} ({} triggers, {} decorators)",
            config_path.display(),
            config.triggers.len(),
            config.decorators.len()
        );
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/baukasten-editor");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Builds editor options, compiling decorator patterns and validating
    /// trigger characters.
    pub fn to_options(&self) -> Result<EditorOptions, ConfigError> {
        let triggers = self
            .triggers
            .iter()
            .enumerate()
            .map(|(index, t)| {
                t.to_definition()
                    .map_err(|source| ConfigError::InvalidTrigger { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let decorators = self
            .decorators
            .iter()
            .enumerate()
            .map(|(index, d)| {
                d.to_rule()
                    .map_err(|source| ConfigError::InvalidDecorator { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EditorOptions {
            triggers,
            decorators,
            disabled: self.disabled,
            read_only: self.read_only,
            placeholder: self.placeholder.clone(),
            initial_value: self.initial_content()?,
        })
    }

    fn initial_content(&self) -> Result<Option<String>, ConfigError> {
        if self.initial_value.is_some() {
            return Ok(self.initial_value.clone());
        }
        let Some(path) = &self.initial_file else {
            return Ok(None);
        };
        std::fs::read_to_string(path)
            .map(Some)
            .map_err(|source| ConfigError::InitialFileError {
                path: path.clone(),
                source,
            })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

impl TriggerConfig {
    pub fn to_definition(&self) -> Result<TriggerDefinition, EngineError> {
        let trigger = TriggerDefinition::parse_trigger(&self.trigger)?;
        if self.suggestions.is_empty() {
            log::warn!("trigger {trigger:?} has no suggestions");
        }
        let suggestions = self
            .suggestions
            .iter()
            .map(SuggestionConfig::to_suggestion)
            .collect();
        let definition = TriggerDefinition::new(trigger, suggestions);
        Ok(match self.serialize_field.clone() {
            Some(field) => {
                definition.with_serialize(move |s| field_value(trigger, &field, s))
            }
            None => definition,
        })
    }
}

impl SuggestionConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: None,
            disabled: false,
        }
    }

    pub fn with_data(mut self, data: impl Into<toml::Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn to_suggestion(&self) -> Suggestion {
        Suggestion {
            label: self.label.clone(),
            data: self.data.as_ref().and_then(|data| payload(&self.label, data)),
            disabled: self.disabled,
        }
    }
}

impl DecoratorConfig {
    pub fn to_rule(&self) -> Result<DecoratorRule, EngineError> {
        let rule = DecoratorRule::pattern(&self.pattern, self.class.clone())?;
        Ok(match &self.style {
            Some(style) => rule.with_style(style.clone()),
            None => rule,
        })
    }
}

/// Converts a configured payload to JSON. Strings are parsed as JSON text.
fn payload(label: &str, data: &toml::Value) -> Option<Value> {
    let value = match data {
        toml::Value::String(text) => serde_json::from_str(text).ok(),
        other => toml_to_json(other),
    };
    if value.is_none() {
        log::warn!("suggestion {label:?}: payload is not valid JSON, ignoring it");
    }
    value
}

/// `None` when the value has no JSON counterpart (datetimes, NaN).
fn toml_to_json(value: &toml::Value) -> Option<Value> {
    match value {
        toml::Value::String(s) => Some(Value::String(s.clone())),
        toml::Value::Integer(i) => Some(Value::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        toml::Value::Boolean(b) => Some(Value::Bool(*b)),
        toml::Value::Datetime(_) => None,
        toml::Value::Array(items) => items
            .iter()
            .map(toml_to_json)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        toml::Value::Table(table) => table
            .iter()
            .map(|(key, value)| toml_to_json(value).map(|value| (key.clone(), value)))
            .collect::<Option<serde_json::Map<_, _>>>()
            .map(Value::Object),
    }
}

/// `data[field]` of a suggestion as text, or trigger + label without it.
fn field_value(trigger: char, field: &str, suggestion: &Suggestion) -> String {
    match suggestion.data.as_ref().and_then(|data| data.get(field)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => format!("{trigger}{}", suggestion.label),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baukasten_editor_engine::editing::{Editor, Key, KeyInput};
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    const CHAT: &str = r#"
placeholder = "Message #general"

[[triggers]]
trigger = "@"
serialize_field = "id"

[[triggers.suggestions]]
label = "Alice"
data = { id = "U01" }

[[triggers.suggestions]]
label = "Bob"
disabled = true

[[decorators]]
pattern = '#\w+'
class = "channel"
style = "cyan"
"#;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/baukasten-editor/config.toml"));
    }

    #[test]
    fn test_parse_chat_config() {
        let config: Config = toml::from_str(CHAT).unwrap();

        assert_eq!(config.placeholder.as_deref(), Some("Message #general"));
        assert!(!config.read_only);
        assert_eq!(config.triggers.len(), 1);
        assert_eq!(config.triggers[0].suggestions.len(), 2);
        assert!(config.triggers[0].suggestions[1].disabled);
        assert_eq!(
            config.triggers[0].suggestions[0].to_suggestion().data,
            Some(serde_json::json!({ "id": "U01" }))
        );
        assert_eq!(config.decorators[0].style.as_deref(), Some("cyan"));
    }

    #[test]
    fn test_to_options_builds_a_working_editor() {
        let config: Config = toml::from_str(CHAT).unwrap();
        let mut editor = Editor::new(config.to_options().unwrap());
        editor.focus();

        for c in "@al".chars() {
            editor.handle_key(KeyInput::new(Key::Char(c)));
        }
        editor.handle_key(KeyInput::new(Key::Enter));

        assert_eq!(editor.text(), "U01 ");
        assert_eq!(editor.snapshot().lines[0].text(), "@Alice ");
    }

    #[test]
    fn test_serialize_field_falls_back_to_label() {
        let alice = Suggestion::new("Alice");
        assert_eq!(field_value('@', "id", &alice), "@Alice");

        let numbered = Suggestion::new("Bob").with_data(serde_json::json!({ "id": 7 }));
        assert_eq!(field_value('@', "id", &numbered), "7");
    }

    fn loaded_suggestions(toml_text: &str) -> Vec<Suggestion> {
        let config: Config = toml::from_str(toml_text).unwrap();
        let options = config.to_options().unwrap();
        options.triggers[0].suggestions.clone()
    }

    #[test]
    fn test_unrepresentable_payload_is_dropped() {
        let suggestions = loaded_suggestions(
            r#"
[[triggers]]
trigger = "@"

[[triggers.suggestions]]
label = "Alice"
data = 1979-05-27T07:32:00Z

[[triggers.suggestions]]
label = "Bob"
data = { since = 1979-05-27 }
"#,
        );

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].label, "Alice");
        assert_eq!(suggestions[0].data, None);
        assert_eq!(suggestions[1].label, "Bob");
        assert_eq!(suggestions[1].data, None);
    }

    #[test]
    fn test_payload_strings_are_parsed_as_json() {
        let suggestions = loaded_suggestions(
            r#"
[[triggers]]
trigger = "@"

[[triggers.suggestions]]
label = "Alice"
data = '{"id": "U09", "tags": [1, 2]}'

[[triggers.suggestions]]
label = "Bob"
data = "{not json"
"#,
        );

        assert_eq!(
            suggestions[0].data,
            Some(serde_json::json!({ "id": "U09", "tags": [1, 2] }))
        );
        assert_eq!(suggestions[1].label, "Bob");
        assert_eq!(suggestions[1].data, None);
    }

    #[test]
    fn test_bad_payload_in_file_keeps_the_editor_usable() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            r#"
[[triggers]]
trigger = "@"
serialize_field = "id"

[[triggers.suggestions]]
label = "Alice"
data = "{not json"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let mut editor = Editor::new(config.to_options().unwrap());
        editor.focus();
        for c in "@al".chars() {
            editor.handle_key(KeyInput::new(Key::Char(c)));
        }
        editor.handle_key(KeyInput::new(Key::Enter));

        assert_eq!(editor.text(), "@Alice ");
    }

    #[test]
    fn test_invalid_trigger_is_reported() {
        let config: Config = toml::from_str(
            r#"
[[triggers]]
trigger = "@@"
"#,
        )
        .unwrap();

        let err = config.to_options().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTrigger { index: 0, .. }));
    }

    #[test]
    fn test_invalid_decorator_is_reported() {
        let config: Config = toml::from_str(
            r#"
[[decorators]]
pattern = "(unclosed"
class = "broken"
"#,
        )
        .unwrap();

        let err = config.to_options().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDecorator { index: 0, .. }));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("BAUKASTEN_TEST_DIR", "/test/env/path");
        }

        let path = PathBuf::from("$BAUKASTEN_TEST_DIR/draft.txt");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/draft.txt")));

        unsafe {
            env::remove_var("BAUKASTEN_TEST_DIR");
        }
    }

    #[test]
    fn test_initial_file_seeds_the_editor() {
        let temp_dir = TempDir::new().unwrap();
        let draft = temp_dir.path().join("draft.txt");
        std::fs::write(&draft, "hello\nworld").unwrap();

        let config = Config {
            initial_file: Some(draft),
            ..Default::default()
        };
        let options = config.to_options().unwrap();
        assert_eq!(options.initial_value.as_deref(), Some("hello\nworld"));

        let config = Config {
            initial_value: Some("inline".into()),
            initial_file: Some(temp_dir.path().join("missing.txt")),
            ..Default::default()
        };
        assert_eq!(
            config.to_options().unwrap().initial_value.as_deref(),
            Some("inline")
        );
    }

    #[test]
    fn test_missing_initial_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            initial_file: Some(temp_dir.path().join("missing.txt")),
            ..Default::default()
        };
        assert!(matches!(
            config.to_options(),
            Err(ConfigError::InitialFileError { .. })
        ));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "triggers = 3").unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            placeholder: Some("Type here".into()),
            read_only: true,
            triggers: vec![TriggerConfig {
                trigger: "#".into(),
                serialize_field: None,
                suggestions: vec![
                    SuggestionConfig::new("general").with_data(r#"{"id": "C1"}"#),
                    SuggestionConfig::new("archived").disabled(),
                ],
            }],
            decorators: vec![DecoratorConfig {
                pattern: r"https?://\S+".into(),
                class: "link".into(),
                style: None,
            }],
            ..Default::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded.placeholder, test_config.placeholder);
        assert!(loaded.read_only);
        assert_eq!(loaded.triggers[0].trigger, "#");
        assert_eq!(loaded.triggers[0].suggestions, test_config.triggers[0].suggestions);
        assert_eq!(loaded.decorators[0].pattern, test_config.decorators[0].pattern);
    }
}
