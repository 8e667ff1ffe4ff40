use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AliasParseError {
    #[error("entry '{0}' must look like field=column|column")]
    MalformedEntry(String),

    #[error("field '{0}' has no candidate columns")]
    NoCandidates(String),
}

/// Semantic field name to ordered candidate physical column names.
///
/// The store schema evolved over time, so the same concept may be spelled
/// differently depending on the deployment (`published` vs `is_published`).
/// The first candidate present in the probed field set wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAliases(BTreeMap<String, Vec<String>>);

impl Default for FieldAliases {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert("published".to_string(), vec!["published".to_string(), "is_published".to_string()]);
        table.insert("available".to_string(), vec!["available".to_string(), "is_available".to_string()]);
        Self(table)
    }
}

impl FieldAliases {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, field: impl Into<String>, candidates: &[&str]) -> Self {
        self.0.insert(field.into(), candidates.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Parse `field=col_a|col_b;other=col_c`.
    pub fn parse(text: &str) -> Result<Self, AliasParseError> {
        let mut table = BTreeMap::new();
        for entry in text.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (field, columns) = entry
                .split_once('=')
                .ok_or_else(|| AliasParseError::MalformedEntry(entry.to_string()))?;
            let field = field.trim();
            if field.is_empty() {
                return Err(AliasParseError::MalformedEntry(entry.to_string()));
            }
            let candidates: Vec<String> = columns
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if candidates.is_empty() {
                return Err(AliasParseError::NoCandidates(field.to_string()));
            }
            table.insert(field.to_string(), candidates);
        }
        Ok(Self(table))
    }

    pub fn candidates(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Physical column for `field` given the probed column set. Fields with no
    /// alias entry are their own single candidate. `None` means no spelling is
    /// present and the constraint should be skipped.
    pub fn resolve(&self, field: &str, present: Option<&BTreeSet<String>>) -> Option<String> {
        let present = present?;
        match self.candidates(field) {
            Some(candidates) => candidates.iter().find(|c| present.contains(*c)).cloned(),
            None => present.contains(field).then(|| field.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn prefers_first_candidate_present() {
        let aliases = FieldAliases::default();
        assert_eq!(
            aliases.resolve("published", Some(&columns(&["id", "is_published", "published"]))),
            Some("published".to_string())
        );
        assert_eq!(
            aliases.resolve("published", Some(&columns(&["id", "is_published"]))),
            Some("is_published".to_string())
        );
    }

    #[test]
    fn absent_spelling_or_unknown_schema_skips() {
        let aliases = FieldAliases::default();
        assert_eq!(aliases.resolve("published", Some(&columns(&["id", "name"]))), None);
        assert_eq!(aliases.resolve("published", None), None);
    }

    #[test]
    fn unlisted_field_is_its_own_candidate() {
        let aliases = FieldAliases::empty();
        assert_eq!(aliases.resolve("status", Some(&columns(&["status"]))), Some("status".to_string()));
        assert_eq!(aliases.resolve("status", Some(&columns(&["state"]))), None);
    }

    #[test]
    fn parses_env_value() {
        let aliases = FieldAliases::parse("published = published | is_published ; featured=featured").unwrap();
        assert_eq!(
            aliases,
            FieldAliases::empty()
                .with("published", &["published", "is_published"])
                .with("featured", &["featured"])
        );
    }

    #[test]
    fn rejects_malformed_value() {
        assert_eq!(
            FieldAliases::parse("published"),
            Err(AliasParseError::MalformedEntry("published".to_string()))
        );
        assert_eq!(
            FieldAliases::parse("published=|"),
            Err(AliasParseError::NoCandidates("published".to_string()))
        );
    }
}
