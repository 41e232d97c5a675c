use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::ancestor_keys;

/// Per-resource field restrictions applied while building contexts.
///
/// Keys are relative to the resource root (`name.family`, not
/// `Patient.name.family`). Choice elements are addressed by their schema
/// key (`multipleBirth[x]`); a concrete choice name such as
/// `multipleBirthInteger` matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldAccessPolicy {
    pub hidden_fields: HashSet<String>,
    pub readonly_fields: HashSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProps {
    pub readonly: bool,
    pub hidden: bool,
}

impl FieldAccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_field(mut self, key: impl Into<String>) -> Self {
        self.hidden_fields.insert(key.into());
        self
    }

    pub fn with_readonly_field(mut self, key: impl Into<String>) -> Self {
        self.readonly_fields.insert(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hidden_fields.is_empty() && self.readonly_fields.is_empty()
    }

    /// Hidden when the key or any of its ancestors is hidden.
    pub fn is_hidden(&self, key: &str) -> bool {
        Self::matches(&self.hidden_fields, key)
    }

    /// Hidden keys are read-only too.
    pub fn is_readonly(&self, key: &str) -> bool {
        self.is_hidden(key) || Self::matches(&self.readonly_fields, key)
    }

    pub fn props(&self, key: &str) -> ExtendedProps {
        ExtendedProps {
            readonly: self.is_readonly(key),
            hidden: self.is_hidden(key),
        }
    }

    fn matches(fields: &HashSet<String>, key: &str) -> bool {
        !fields.is_empty()
            && (fields.contains(key) || ancestor_keys(key).any(|ancestor| fields.contains(ancestor)))
    }
}

/// Key of an absolute path relative to its resource root.
pub(crate) fn resource_key(path: &str) -> Option<&str> {
    path.split_once('.').map(|(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_implies_readonly_and_covers_descendants() {
        let policy = FieldAccessPolicy::new()
            .with_hidden_field("name")
            .with_readonly_field("identifier");

        assert_eq!(
            policy.props("name.given"),
            ExtendedProps {
                readonly: true,
                hidden: true
            }
        );
        assert_eq!(
            policy.props("identifier.system"),
            ExtendedProps {
                readonly: true,
                hidden: false
            }
        );
        assert_eq!(policy.props("gender"), ExtendedProps::default());
        assert_eq!(policy.props("names"), ExtendedProps::default());
    }

    #[test]
    fn resource_key_drops_first_segment() {
        assert_eq!(resource_key("Patient.name.given"), Some("name.given"));
        assert_eq!(resource_key("Patient"), None);
    }
}
