//! Type definitions: semi-structured documents the registry merges but mostly does not read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Merged/per-domain type maps are ordered so serialized output is deterministic.
pub type TypeMap = BTreeMap<String, TypeDefinition>;

/// A display reference for an icon, usually a `data:` URI.
pub type IconReference = String;

/// One type definition document.
///
/// The registry only inspects [`TypeDefinition::ICON`] and [`TypeDefinition::ICON_SOURCE`];
/// every other field passes through untouched for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDefinition(Map<String, Value>);

impl TypeDefinition {
    pub const ICON: &'static str = "icon";
    pub const ICON_SOURCE: &'static str = "iconSource";

    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accepts only JSON objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.0.get(Self::ICON).and_then(Value::as_str)
    }

    #[must_use]
    pub fn icon_source(&self) -> Option<&str> {
        self.0.get(Self::ICON_SOURCE).and_then(Value::as_str)
    }

    /// Replaces `icon` with a resolved reference, keeping the original in `iconSource`.
    ///
    /// A definition already carrying an `iconSource` keeps it: that value is the original
    /// reference from the package, and re-resolving must not overwrite it with a URI.
    pub fn resolve_icon(&mut self, reference: IconReference) {
        if let Some(original) = self.0.get(Self::ICON).cloned()
            && !self.0.contains_key(Self::ICON_SOURCE)
        {
            self.0.insert(Self::ICON_SOURCE.to_owned(), original);
        }
        self.0.insert(Self::ICON.to_owned(), Value::String(reference));
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for TypeDefinition {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
