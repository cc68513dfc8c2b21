//! Functional categorization of processes by name.
//!
//! Categories come from curated substring lists loaded from TOML: a built-in
//! set embedded at compile time, optionally extended by a system-wide file
//! and one in the working directory. The same data carries the critical
//! denylist consumed by the termination controller, so both classifiers share
//! one injectable [`CategoryRules`] value.

use crate::model::Category;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Curated name lists, checked in order: system, browsers, dev_tools.
/// `critical` is the termination denylist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRules {
    #[serde(default)]
    pub system: Vec<String>,
    #[serde(default)]
    pub browsers: Vec<String>,
    #[serde(default)]
    pub dev_tools: Vec<String>,
    #[serde(default)]
    pub critical: Vec<String>,
}

/// Root structure for the categories TOML file.
#[derive(Deserialize)]
struct CategoriesConfig {
    categories: CategoryRules,
}

impl CategoryRules {
    /// Classifies a process name. Case-insensitive substring containment,
    /// first matching list wins, no match falls through to Application.
    pub fn classify(&self, name: &str) -> Category {
        let name_lower = name.to_lowercase();

        if self.system.iter().any(|s| name_lower.contains(&s.to_lowercase())) {
            return Category::System;
        }
        if self.browsers.iter().any(|s| name_lower.contains(&s.to_lowercase())) {
            return Category::Browser;
        }
        if self.dev_tools.iter().any(|s| name_lower.contains(&s.to_lowercase())) {
            return Category::DevelopmentTool;
        }
        Category::Application
    }

    /// Whether a process name matches the critical-process denylist.
    pub fn is_critical(&self, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        self.critical
            .iter()
            .any(|s| name_lower.contains(&s.to_lowercase()))
    }

    fn extend_from(&mut self, other: CategoryRules) {
        self.system.extend(other.system);
        self.browsers.extend(other.browsers);
        self.dev_tools.extend(other.dev_tools);
        self.critical.extend(other.critical);
    }
}

/// Helper: parse rules from TOML string and append them to `rules`.
fn load_rules_from_str(content: &str, rules: &mut CategoryRules) {
    match toml::from_str::<CategoriesConfig>(content) {
        Ok(parsed) => rules.extend_from(parsed.categories),
        Err(e) => warn!("Failed to parse categories TOML: {}", e),
    }
}

/// Helper: append rules from a TOML file path, if it exists.
fn load_rules_from_file(path: &str, rules: &mut CategoryRules) {
    let p = Path::new(path);
    if !p.exists() {
        return;
    }
    match fs::read_to_string(p) {
        Ok(content) => {
            load_rules_from_str(&content, rules);
            debug!("Loaded additional category rules from {}", path);
        }
        Err(e) => {
            warn!("Failed to read categories file {}: {}", path, e);
        }
    }
}

/// Default classification rules: the embedded lists plus optional overrides.
pub static DEFAULT_RULES: Lazy<CategoryRules> = Lazy::new(|| {
    let mut rules = CategoryRules::default();

    // 1) built-in rules from embedded file
    let content = include_str!("../../data/categories.toml");
    load_rules_from_str(content, &mut rules);

    // 2) optional system-wide rules
    load_rules_from_file("/etc/procsnap/categories.toml", &mut rules);

    // 3) optional rules in current working directory
    load_rules_from_file("./categories.toml", &mut rules);

    rules
});
