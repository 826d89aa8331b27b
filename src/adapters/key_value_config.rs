//! In-memory flat key-value configuration.
//!
//! Every key lives in one section (default `strategy`), which is how a
//! strategy record looks when it is built programmatically rather than read
//! from an INI file.

use std::collections::HashMap;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Default)]
pub struct KeyValueConfig {
    section: String,
    values: HashMap<String, String>,
}

impl KeyValueConfig {
    pub fn new(section: &str) -> Self {
        Self {
            section: section.to_lowercase(),
            values: HashMap::new(),
        }
    }

    pub fn strategy() -> Self {
        Self::new("strategy")
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.values
            .insert(key.to_lowercase(), value.to_string().trim().to_string());
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        if !section.eq_ignore_ascii_case(&self.section) {
            return None;
        }
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }
}

impl<K: AsRef<str>, V: ToString> FromIterator<(K, V)> for KeyValueConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = KeyValueConfig::strategy();
        for (key, value) in iter {
            config.insert(key.as_ref(), value);
        }
        config
    }
}

impl ConfigPort for KeyValueConfig {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.lookup(section, key).map(str::to_string)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.lookup(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.lookup(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.lookup(section, key)
            .and_then(FileConfigAdapter::parse_bool)
            .unwrap_or(default)
    }
}
