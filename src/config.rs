//! Layered configuration resolution. Values come from a YAML file, and any value can be overridden
//! through an environment variable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value as YamlValue;

use crate::{fields, Value};

/// The naming conventions used to discover configuration. These are fixed per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Environment variables overriding configuration keys start with this prefix followed by an
    /// underscore. See [`env_var_name()`].
    pub env_prefix: &'static str,
    /// The directory under the user's home directory that is searched first.
    pub home_subdir: &'static str,
    /// The file name looked for in every search directory.
    pub file_name: &'static str,
}

impl Conventions {
    pub const BLOG: Conventions = Conventions {
        env_prefix: "BLOG",
        home_subdir: ".blog",
        file_name: "blog.yaml",
    };
}

impl Default for Conventions {
    fn default() -> Self {
        Conventions::BLOG
    }
}

/// Errors raised while resolving configuration. Only [`ConfigError::HomeDirUnresolvable`] is ever
/// returned from [`ConfigResolver::resolve()`]. The others are logged as warnings and resolution
/// continues without a file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    HomeDirUnresolvable,
    #[error("no '{file_name}' found in {searched:?}")]
    NotFound {
        file_name: String,
        searched: Vec<PathBuf>,
    },
    #[error("could not read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The name of the environment variable that overrides `key`: the key is upper cased, and `.` is
/// replaced by `_`. Other characters, including `-`, are kept as is.
///
/// ```
/// assert_eq!(blog_log::env_var_name("BLOG", "log.level"), "BLOG_LOG_LEVEL");
/// assert_eq!(blog_log::env_var_name("BLOG", "log.disable-caller"), "BLOG_LOG_DISABLE-CALLER");
/// ```
pub fn env_var_name(prefix: &str, key: &str) -> String {
    let key = key.to_uppercase().replace('.', "_");
    if prefix.is_empty() {
        key
    } else {
        format!("{}_{key}", prefix.to_uppercase())
    }
}

/// Finds and loads the configuration file, and snapshots the matching environment variables.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    conventions: Conventions,
    config_file: Option<PathBuf>,
    /// Looked up once on construction. `None` if the home directory can't be determined.
    home_dir: Option<PathBuf>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(Conventions::default())
    }
}

impl ConfigResolver {
    pub fn new(conventions: Conventions) -> Self {
        Self {
            conventions,
            config_file: None,
            home_dir: dirs::home_dir(),
        }
    }

    /// Use this file instead of searching for one. `None` restores the search behavior.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Search this home directory instead of the current user's. `None` behaves as if the home
    /// directory can't be determined.
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    /// The files that will be tried, in order. Only fails when no explicit file was set and the
    /// home directory can't be determined.
    pub fn candidates(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if let Some(path) = &self.config_file {
            return Ok(vec![path.clone()]);
        }

        let home = self
            .home_dir
            .as_ref()
            .ok_or(ConfigError::HomeDirUnresolvable)?;
        Ok(vec![
            home.join(self.conventions.home_subdir)
                .join(self.conventions.file_name),
            Path::new(".").join(self.conventions.file_name),
        ])
    }

    /// Resolve the settings using the process environment. A missing or broken configuration file
    /// is logged as a warning and results in settings without a file layer.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let candidates = self.candidates()?;

        Ok(self.resolve_from(&candidates, std::env::vars()))
    }

    /// [`resolve()`][Self::resolve()], but with explicit candidates and environment.
    pub fn resolve_from(
        &self,
        candidates: &[PathBuf],
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Settings {
        let mut settings = Settings::empty(self.conventions.env_prefix).with_env(env);

        match self.load_first(candidates) {
            Ok((path, file)) => {
                crate::info(
                    "using config file",
                    fields!["file" => path.display().to_string()],
                );
                settings.file = file;
                settings.source = Some(path);
            }
            Err(err) => crate::warn(
                "failed to read configuration file",
                fields!["err" => Value::error(&err)],
            ),
        }

        settings
    }

    fn load_first(
        &self,
        candidates: &[PathBuf],
    ) -> Result<(PathBuf, BTreeMap<String, YamlValue>), ConfigError> {
        // An explicit file is always read so a missing file is reported as such
        let path = if self.config_file.is_some() {
            candidates.first().cloned()
        } else {
            candidates.iter().find(|path| path.is_file()).cloned()
        };
        let path = path.ok_or_else(|| ConfigError::NotFound {
            file_name: self.conventions.file_name.to_owned(),
            searched: candidates.to_vec(),
        })?;

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let file = parse_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok((path, file))
    }
}

/// Resolved configuration: a flat map of lower cased dotted keys read from the configuration file,
/// plus a snapshot of the environment variables that can override them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    env_prefix: String,
    file: BTreeMap<String, YamlValue>,
    env: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl Settings {
    /// Settings without any values.
    pub fn empty(env_prefix: &str) -> Self {
        Self {
            env_prefix: env_prefix.to_owned(),
            ..Default::default()
        }
    }

    /// Build settings from a YAML document and an environment. Mostly useful for tests.
    pub fn from_yaml_str(
        env_prefix: &str,
        yaml: &str,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, serde_yaml::Error> {
        let mut settings = Settings::empty(env_prefix).with_env(env);
        settings.file = parse_yaml(yaml)?;

        Ok(settings)
    }

    /// Keep the variables that start with the prefix. Empty values don't override anything and are
    /// dropped.
    fn with_env(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        let prefix = env_var_name(&self.env_prefix, "");
        self.env = env
            .into_iter()
            .filter(|(name, value)| name.starts_with(&prefix) && !value.is_empty())
            .collect();
        self
    }

    /// The configuration file the values were read from, if any.
    pub fn config_file_used(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether either the file or the environment provides a value for `key`.
    pub fn is_set(&self, key: &str) -> bool {
        self.env_value(key).is_some() || self.file_value(key).is_some()
    }

    /// The value for `key` as a string. Missing keys, mappings and sequences result in an empty
    /// string.
    pub fn get_string(&self, key: &str) -> String {
        if let Some(value) = self.env_value(key) {
            return value.to_owned();
        }

        self.file_value(key).and_then(scalar_to_string).unwrap_or_default()
    }

    /// The value for `key` as a boolean. Anything that isn't recognized as a boolean is `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        if let Some(value) = self.env_value(key) {
            return parse_bool(value).unwrap_or(false);
        }

        match self.file_value(key) {
            Some(YamlValue::Bool(b)) => *b,
            Some(YamlValue::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(YamlValue::String(s)) => parse_bool(s).unwrap_or(false),
            _ => false,
        }
    }

    /// The value for `key` as a list of strings. Environment variables are split on whitespace, a
    /// single scalar in the file becomes a list with one element.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        if let Some(value) = self.env_value(key) {
            return value.split_whitespace().map(String::from).collect();
        }

        match self.file_value(key) {
            Some(YamlValue::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(YamlValue::String(s)) => s.split_whitespace().map(String::from).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Every key from the configuration file with environment overrides applied.
    pub fn all_settings(&self) -> BTreeMap<String, YamlValue> {
        self.file
            .iter()
            .map(|(key, value)| match self.env_value(key) {
                Some(overridden) => (key.clone(), YamlValue::String(overridden.to_owned())),
                None => (key.clone(), value.clone()),
            })
            .collect()
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .get(&env_var_name(&self.env_prefix, key))
            .map(String::as_str)
    }

    fn file_value(&self, key: &str) -> Option<&YamlValue> {
        self.file.get(&key.to_lowercase())
    }
}

/// Parse a YAML document into a flat map of dotted keys. An empty document results in an empty
/// map. Any other top level value than a mapping is an error.
fn parse_yaml(contents: &str) -> Result<BTreeMap<String, YamlValue>, serde_yaml::Error> {
    let mut flattened = BTreeMap::new();
    match serde_yaml::from_str::<YamlValue>(contents)? {
        YamlValue::Null => (),
        YamlValue::Mapping(mapping) => flatten_into(&mut flattened, "", mapping),
        _ => {
            // Produces a proper error message pointing at the document
            serde_yaml::from_str::<serde_yaml::Mapping>(contents)?;
        }
    }

    Ok(flattened)
}

fn flatten_into(
    target: &mut BTreeMap<String, YamlValue>,
    prefix: &str,
    mapping: serde_yaml::Mapping,
) {
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            continue;
        };
        let key = if prefix.is_empty() {
            key.to_lowercase()
        } else {
            format!("{prefix}.{}", key.to_lowercase())
        };

        match value {
            YamlValue::Mapping(nested) => flatten_into(target, &key, nested),
            YamlValue::Tagged(tagged) => match tagged.value {
                YamlValue::Mapping(nested) => flatten_into(target, &key, nested),
                value => {
                    target.insert(key, value);
                }
            },
            value => {
                target.insert(key, value);
            }
        }
    }
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Tagged(tagged) => scalar_to_string(&tagged.value),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_var_names() {
        assert_eq!(env_var_name("BLOG", "log.level"), "BLOG_LOG_LEVEL");
        assert_eq!(env_var_name("blog", "db.Password"), "BLOG_DB_PASSWORD");
        assert_eq!(env_var_name("", "a.b.c"), "A_B_C");
        assert_eq!(
            env_var_name("BLOG", "log.output-paths"),
            "BLOG_LOG_OUTPUT-PATHS"
        );
    }

    #[test]
    fn flattens_nested_mappings() {
        let settings = Settings::from_yaml_str(
            "BLOG",
            "log:\n  Level: debug\ndb:\n  port: 3306\n  pool:\n    max: 10\n",
            Vec::new(),
        )
        .unwrap();
        assert_eq!(settings.get_string("log.level"), "debug");
        assert_eq!(settings.get_string("LOG.LEVEL"), "debug");
        assert_eq!(settings.get_string("db.port"), "3306");
        assert_eq!(settings.get_string("db.pool.max"), "10");
        assert_eq!(settings.get_string("db"), "");
        assert_eq!(settings.get_string("missing.key"), "");
    }

    #[test]
    fn environment_wins_over_file() {
        let settings = Settings::from_yaml_str(
            "BLOG",
            "log:\n  level: debug\n  format: json\n",
            env(&[
                ("BLOG_LOG_LEVEL", "error"),
                ("OTHER_LOG_FORMAT", "console"),
                ("BLOG_LOG_FORMAT", ""),
            ]),
        )
        .unwrap();
        assert_eq!(settings.get_string("log.level"), "error");
        // Other prefixes and empty values don't override anything
        assert_eq!(settings.get_string("log.format"), "json");
        assert_eq!(
            settings.all_settings().get("log.level"),
            Some(&YamlValue::String(String::from("error")))
        );
    }

    #[test]
    fn environment_only_keys() {
        let settings = Settings::empty("BLOG").with_env(env(&[
            ("BLOG_LOG_DISABLE-CALLER", "T"),
            ("BLOG_LOG_OUTPUT-PATHS", "stderr  /var/log/blog.log"),
        ]));
        assert!(settings.is_set("log.disable-caller"));
        assert!(settings.get_bool("log.disable-caller"));
        assert_eq!(
            settings.get_string_list("log.output-paths"),
            ["stderr", "/var/log/blog.log"]
        );
        assert!(!settings.is_set("log.level"));
    }

    #[test]
    fn booleans() {
        let settings = Settings::from_yaml_str(
            "BLOG",
            "a: true\nb: \"True\"\nc: 1\nd: yes please\ne: [true]\n",
            Vec::new(),
        )
        .unwrap();
        assert!(settings.get_bool("a"));
        assert!(settings.get_bool("b"));
        assert!(settings.get_bool("c"));
        assert!(!settings.get_bool("d"));
        assert!(!settings.get_bool("e"));
        assert!(!settings.get_bool("missing"));

        for (value, expected) in [("1", Some(true)), ("False", Some(false)), ("yes", None)] {
            assert_eq!(parse_bool(value), expected, "{value:?}");
        }
    }

    #[test]
    fn string_lists() {
        let settings = Settings::from_yaml_str(
            "BLOG",
            "list: [stdout, 1, true]\nsingle: stderr\n",
            Vec::new(),
        )
        .unwrap();
        assert_eq!(settings.get_string_list("list"), ["stdout", "1", "true"]);
        assert_eq!(settings.get_string_list("single"), ["stderr"]);
        assert!(settings.get_string_list("missing").is_empty());
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert!(Settings::from_yaml_str("BLOG", "- a\n- b\n", Vec::new()).is_err());
        assert!(Settings::from_yaml_str("BLOG", "log: [unclosed\n", Vec::new()).is_err());
        assert!(Settings::from_yaml_str("BLOG", "", Vec::new()).is_ok());
    }

    #[test]
    fn searches_home_then_working_directory() {
        let resolver = ConfigResolver::new(Conventions::BLOG)
            .with_home_dir(Some(PathBuf::from("/home/ada")));
        assert_eq!(
            resolver.candidates().unwrap(),
            [
                PathBuf::from("/home/ada/.blog/blog.yaml"),
                PathBuf::from("./blog.yaml")
            ]
        );

        let explicit = resolver.with_config_file(Some(PathBuf::from("/etc/blog.yaml")));
        assert_eq!(explicit.candidates().unwrap(), [PathBuf::from("/etc/blog.yaml")]);
    }

    #[test]
    fn unresolvable_home_dir_is_an_error() {
        let resolver = ConfigResolver::new(Conventions::BLOG).with_home_dir(None);
        assert!(matches!(
            resolver.candidates(),
            Err(ConfigError::HomeDirUnresolvable)
        ));
        assert!(matches!(
            resolver.resolve(),
            Err(ConfigError::HomeDirUnresolvable)
        ));

        // An explicit file doesn't need the home directory
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.yaml");
        fs::write(&path, "log:\n  level: warn\n").unwrap();
        let settings = resolver
            .with_config_file(Some(path.clone()))
            .resolve()
            .unwrap();
        assert_eq!(settings.config_file_used(), Some(path.as_path()));
    }

    #[test]
    fn nothing_found_results_in_empty_settings() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(Conventions::BLOG);
        let candidates = [dir.path().join("home/blog.yaml"), dir.path().join("blog.yaml")];

        let settings = resolver.resolve_from(&candidates, Vec::new());
        assert_eq!(settings.config_file_used(), None);
        assert!(settings.all_settings().is_empty());
        assert_eq!(settings.get_string("log.level"), "");
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home.yaml");
        let cwd = dir.path().join("cwd.yaml");
        fs::write(&cwd, "log:\n  level: warn\n").unwrap();

        let resolver = ConfigResolver::new(Conventions::BLOG);
        let settings = resolver.resolve_from(&[home.clone(), cwd.clone()], Vec::new());
        assert_eq!(settings.config_file_used(), Some(cwd.as_path()));
        assert_eq!(settings.get_string("log.level"), "warn");

        fs::write(&home, "log:\n  level: debug\n").unwrap();
        let settings = resolver.resolve_from(&[home.clone(), cwd], Vec::new());
        assert_eq!(settings.config_file_used(), Some(home.as_path()));
        assert_eq!(settings.get_string("log.level"), "debug");
    }

    #[test]
    fn malformed_explicit_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "log: [level: debug\n").unwrap();

        let resolver =
            ConfigResolver::new(Conventions::BLOG).with_config_file(Some(path.clone()));
        let settings = resolver.resolve_from(&[path], env(&[("BLOG_LOG_LEVEL", "error")]));
        assert_eq!(settings.config_file_used(), None);
        assert!(settings.all_settings().is_empty());
        // The environment layer still applies
        assert_eq!(settings.get_string("log.level"), "error");
    }

    #[test]
    fn load_errors_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let resolver =
            ConfigResolver::new(Conventions::BLOG).with_config_file(Some(missing.clone()));
        assert!(matches!(
            resolver.load_first(&[missing.clone()]),
            Err(ConfigError::Read { .. })
        ));

        let resolver = ConfigResolver::new(Conventions::BLOG);
        assert!(matches!(
            resolver.load_first(&[missing]),
            Err(ConfigError::NotFound { .. })
        ));
    }
}
