//! Generation profiles.
//!
//! A profile fixes every tunable size of the generator: the dimension bound,
//! the recursion budgets and the item counts per construct. Profiles are TOML
//! files embedded in the binary at compile time; fields omitted from a file
//! inherit [`Profile::default`], which matches the `default` profile.

use std::path::Path;

use crate::error::{Result, StressError};

/// Every tunable size of a generation run.
///
/// Counts are inclusive `(min, max)` ranges.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Upper bound of every vector and matrix dimension. The lower bound is 1.
    pub max_dimension: usize,
    /// Expression nesting budget; at the limit the literal form is forced.
    pub max_expr_depth: usize,
    /// Operators, calls and parentheses one top-level expression may contain
    /// before every remaining operand is forced to a literal.
    pub max_expr_nodes: usize,
    /// Recursion budget of constant expressions.
    pub max_const_depth: usize,
    /// Statement nesting ceiling; at the limit only flat statements are drawn.
    pub max_stmt_depth: usize,
    /// Top-level items per module, excluding a forced `main`.
    pub module_items: (usize, usize),
    pub record_fields: (usize, usize),
    pub function_params: (usize, usize),
    pub function_body: (usize, usize),
    /// Statements inside a `{ ... }` block.
    pub block_body: (usize, usize),
    pub switch_cases: (usize, usize),
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            max_dimension: 6,
            max_expr_depth: 24,
            max_expr_nodes: 48,
            max_const_depth: 32,
            max_stmt_depth: 10,
            module_items: (1, 10),
            record_fields: (1, 4),
            function_params: (0, 3),
            function_body: (0, 7),
            block_body: (0, 5),
            switch_cases: (0, 5),
        }
    }
}

impl Profile {
    /// Check the invariants the generator relies on.
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_dimension == 0 {
            return Err("max_dimension must be at least 1".to_string());
        }
        let ranges = [
            ("module_items", self.module_items),
            ("record_fields", self.record_fields),
            ("function_params", self.function_params),
            ("function_body", self.function_body),
            ("block_body", self.block_body),
            ("switch_cases", self.switch_cases),
        ];
        for (field, (min, max)) in ranges {
            if min > max {
                return Err(format!("{field} has min {min} greater than max {max}"));
            }
        }
        if self.record_fields.0 == 0 {
            return Err("record_fields min must be at least 1".to_string());
        }
        if self.module_items.0 == 0 {
            return Err("module_items min must be at least 1".to_string());
        }
        Ok(())
    }
}

// Embedded profile TOML data (compiled into the binary).
static PROFILES: &[(&str, &str)] = &[
    ("default", include_str!("../profiles/default.toml")),
    ("small", include_str!("../profiles/small.toml")),
    ("deep", include_str!("../profiles/deep.toml")),
];

/// Names of the embedded profiles.
pub fn available_profiles() -> Vec<&'static str> {
    PROFILES.iter().map(|(name, _)| *name).collect()
}

fn parse_profile_toml(name: &str, toml_str: &str) -> Result<Profile> {
    let profile: Profile = toml::from_str(toml_str).map_err(|source| StressError::ProfileParse {
        name: name.to_string(),
        source,
    })?;
    profile
        .validate()
        .map_err(|reason| StressError::InvalidProfile {
            name: name.to_string(),
            reason,
        })?;
    Ok(profile)
}

/// Get an embedded profile by name, or load one from a file.
///
/// `name_or_path` is treated as a path when it contains `/` or ends with
/// `.toml`.
pub fn get_profile(name_or_path: &str) -> Result<Profile> {
    if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
        let path = Path::new(name_or_path);
        let content = std::fs::read_to_string(path).map_err(|source| StressError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        return parse_profile_toml(name_or_path, &content);
    }

    PROFILES
        .iter()
        .find(|(name, _)| *name == name_or_path)
        .ok_or_else(|| StressError::UnknownProfile {
            name: name_or_path.to_string(),
            available: available_profiles(),
        })
        .and_then(|(name, toml_str)| parse_profile_toml(name, toml_str))
}
