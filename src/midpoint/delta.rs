//! Modification deltas
//!
//! Builders for the `objectModification` documents Midpoint accepts on
//! PATCH, plus the conversion of JSON values into the nested element form
//! used as delta values.

use super::document::{API_TYPES_NS, COMMON_NS, ORG_NS, TYPES_NS};
use crate::error::{MidpointError, Result};
use quick_xml::escape::escape;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Prefix used for every element produced from JSON values
pub const VALUE_PREFIX: &str = "c";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationType {
    Add,
    Replace,
    Delete,
}

impl ModificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModificationType {
    type Err = MidpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "delete" => Ok(Self::Delete),
            other => Err(MidpointError::InvalidParameters(format!(
                "unknown modification type '{other}'"
            ))),
        }
    }
}

/// One (path, kind, value) change; `value` is an already serialized fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDelta {
    pub modification_type: ModificationType,
    pub path: String,
    pub value: String,
}

impl ItemDelta {
    pub fn new(modification_type: ModificationType, path: &str, value: impl Into<String>) -> Self {
        Self {
            modification_type,
            path: path.to_string(),
            value: value.into(),
        }
    }

    /// Wrap the delta in an `objectModification` document
    pub fn to_xml(&self) -> String {
        format!(
            "<objectModification xmlns='{API_TYPES_NS}' xmlns:c='{COMMON_NS}' xmlns:org='{ORG_NS}' xmlns:t='{TYPES_NS}'>\
             <itemDelta>\
             <t:modificationType>{}</t:modificationType>\
             <t:path>{}</t:path>\
             <t:value>{}</t:value>\
             </itemDelta>\
             </objectModification>",
            self.modification_type,
            escape(self.path.as_str()),
            self.value
        )
    }
}

/// JSON `objectModification` document, for the few endpoints fed with JSON
pub fn json_modification(modification_type: ModificationType, path: &str, value: &Value) -> Value {
    json!({
        "objectModification": {
            "itemDelta": {
                "modificationType": modification_type.as_str(),
                "path": path,
                "value": value,
            }
        }
    })
}

/// Convert a JSON object into nested `c:`-prefixed elements.
///
/// Keys keep their insertion order, objects recurse depth-first and arrays
/// repeat the element once per item. Scalars are written verbatim so that a
/// string may itself carry a prepared fragment.
pub fn json_to_xml(value: &Value) -> String {
    let mut out = String::new();
    if let Value::Object(map) = value {
        for (key, val) in map {
            write_entry(&mut out, key, val);
        }
    } else {
        out.push_str(&scalar_text(value));
    }
    tracing::trace!("xml_content: {}", out);
    out
}

fn write_entry(out: &mut String, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                write_entry(out, key, item);
            }
        }
        Value::Object(_) => {
            out.push_str(&format!("<{VALUE_PREFIX}:{key}>"));
            out.push_str(&json_to_xml(value));
            out.push_str(&format!("</{VALUE_PREFIX}:{key}>"));
        }
        scalar => {
            out.push_str(&format!(
                "<{VALUE_PREFIX}:{key}>{}</{VALUE_PREFIX}:{key}>",
                scalar_text(scalar)
            ));
        }
    }
}

/// Text form of a delta value given as JSON
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(_) => json_to_xml(value),
        other => other.to_string(),
    }
}

/// Kind of relationship between two objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Assignment,
    Inducement,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Inducement => "inducement",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship fragment pointing at `source_oid`.
///
/// Resources are wrapped in a construction, roles are plain target
/// references. Any other source type has no known structure.
pub fn relationship_fragment(
    kind: RelationshipKind,
    source_type: &str,
    source_oid: &str,
) -> Result<String> {
    let oid = escape(source_oid);
    match source_type {
        "ResourceType" => Ok(format!(
            "<c:construction><c:resourceRef type=\"c:ResourceType\" oid=\"{oid}\"/></c:construction>"
        )),
        "RoleType" => Ok(format!("<c:targetRef type=\"c:RoleType\" oid=\"{oid}\"/>")),
        other => Err(MidpointError::UnknownStructure {
            relationship: kind.to_string(),
            source_type: other.to_string(),
        }),
    }
}

/// Add-delta linking `source_oid` into the `kind` container of the target
pub fn relationship_delta(
    kind: RelationshipKind,
    source_type: &str,
    source_oid: &str,
) -> Result<ItemDelta> {
    let fragment = relationship_fragment(kind, source_type, source_oid)?;
    Ok(ItemDelta::new(
        ModificationType::Add,
        &format!("c:{}", kind.as_str()),
        fragment,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midpoint::document::{COMMON_NS, TYPES_NS};
    use crate::midpoint::xml;

    #[test]
    fn test_modification_type_parsing() {
        assert_eq!("REPLACE".parse::<ModificationType>().unwrap(), ModificationType::Replace);
        assert_eq!("add".parse::<ModificationType>().unwrap(), ModificationType::Add);
        assert!("merge".parse::<ModificationType>().is_err());
    }

    #[test]
    fn test_json_to_xml_nested_in_order() {
        let value = json!({
            "name": "mail",
            "transport": {"host": "smtp", "port": 25},
            "enabled": true
        });
        assert_eq!(
            json_to_xml(&value),
            "<c:name>mail</c:name><c:transport><c:host>smtp</c:host><c:port>25</c:port></c:transport><c:enabled>true</c:enabled>"
        );
    }

    #[test]
    fn test_json_arrays_repeat_element() {
        let value = json!({"recipient": ["a", "b"]});
        assert_eq!(
            json_to_xml(&value),
            "<c:recipient>a</c:recipient><c:recipient>b</c:recipient>"
        );
    }

    #[test]
    fn test_delta_document_is_well_formed() {
        let delta = ItemDelta::new(
            ModificationType::Replace,
            "c:logging/c:classLogger[3]/level",
            "DEBUG",
        );
        let doc = delta.to_xml();
        let root = xml::parse(doc.as_bytes()).unwrap();
        assert_eq!(root.name, "objectModification");
        let item = root.child_elements().next().unwrap();
        assert_eq!(
            item.child(Some(TYPES_NS), "modificationType").unwrap().text(),
            "replace"
        );
        assert_eq!(
            item.child(Some(TYPES_NS), "path").unwrap().text(),
            "c:logging/c:classLogger[3]/level"
        );
        assert_eq!(item.child(Some(TYPES_NS), "value").unwrap().text(), "DEBUG");
    }

    #[test]
    fn test_resource_fragment_uses_construction() {
        let delta =
            relationship_delta(RelationshipKind::Inducement, "ResourceType", "res-1").unwrap();
        assert_eq!(delta.path, "c:inducement");
        let root = xml::parse(delta.to_xml().as_bytes()).unwrap();
        let construction = root.descendants_named(Some(COMMON_NS), "construction");
        assert_eq!(construction.len(), 1);
        let resource_ref = construction[0].child(Some(COMMON_NS), "resourceRef").unwrap();
        assert_eq!(resource_ref.attribute("oid"), Some("res-1"));
    }

    #[test]
    fn test_role_fragment_uses_target_ref() {
        let fragment =
            relationship_fragment(RelationshipKind::Assignment, "RoleType", "role-1").unwrap();
        assert!(fragment.starts_with("<c:targetRef"));
        assert!(fragment.contains("oid=\"role-1\""));
    }

    #[test]
    fn test_unknown_source_structure() {
        let err =
            relationship_fragment(RelationshipKind::Inducement, "UserType", "u1").unwrap_err();
        assert!(matches!(err, MidpointError::UnknownStructure { .. }));
    }

    #[test]
    fn test_json_delta() {
        let body = json_modification(ModificationType::Add, "requestable", &json!(true));
        assert_eq!(body["objectModification"]["itemDelta"]["modificationType"], "add");
        assert_eq!(body["objectModification"]["itemDelta"]["path"], "requestable");
        assert_eq!(body["objectModification"]["itemDelta"]["value"], true);
    }
}
