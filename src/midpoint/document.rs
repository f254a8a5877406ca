//! Document inspection
//!
//! Pure extraction helpers over documents returned by Midpoint.

use super::endpoints::resolve_endpoint;
use super::xml::{self, Element};
use crate::error::{MidpointError, Result};

pub const COMMON_NS: &str = "http://midpoint.evolveum.com/xml/ns/public/common/common-3";
pub const API_TYPES_NS: &str = "http://midpoint.evolveum.com/xml/ns/public/common/api-types-3";
pub const TYPES_NS: &str = "http://prism.evolveum.com/xml/ns/public/types-3";
pub const ORG_NS: &str = "http://midpoint.evolveum.com/xml/ns/public/common/org-3";

/// Prefixes understood by path queries against Midpoint documents
pub const PREFIXES: &[(&str, &str)] = &[
    ("c", COMMON_NS),
    ("apti", API_TYPES_NS),
    ("t", TYPES_NS),
    ("org", ORG_NS),
];

/// Root `oid` attribute of a document
pub fn oid_of(document: &[u8]) -> Result<String> {
    let root = xml::parse(document)?;
    root.attribute("oid")
        .map(str::to_string)
        .ok_or_else(|| {
            MidpointError::MalformedDocument(format!("<{}> has no oid attribute", root.name))
        })
}

/// Object type of a document: the root element's local name
pub fn object_type_of(document: &[u8]) -> Result<String> {
    Ok(xml::parse(document)?.name)
}

/// REST collection serving the object held in `document`
pub fn endpoint_of(document: &[u8]) -> Result<&'static str> {
    resolve_endpoint(&object_type_of(document)?)
}

/// First object of a search result list, serialized standalone
pub fn first_search_result(document: &[u8]) -> Result<Option<String>> {
    let root = xml::parse(document)?;
    Ok(root
        .child(Some(API_TYPES_NS), "object")
        .map(Element::to_xml_string))
}

/// Value of the first `resultStatus` element anywhere in a task document
pub fn result_status_of(document: &[u8]) -> Result<Option<String>> {
    let root = xml::parse(document)?;
    Ok(root
        .descendants_named(Some(COMMON_NS), "resultStatus")
        .first()
        .map(|e| e.text()))
}

/// A `classLogger` entry of the system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLogger {
    pub id: Option<String>,
    pub package: String,
    pub level: String,
}

/// Existing class loggers, in document order
pub fn class_loggers(document: &[u8]) -> Result<Vec<ClassLogger>> {
    let root = xml::parse(document)?;
    let loggers = root
        .select("c:logging/c:classLogger", PREFIXES)
        .into_iter()
        .map(|logger| ClassLogger {
            id: logger.attribute("id").map(str::to_string),
            package: child_text(logger, "package"),
            level: child_text(logger, "level"),
        })
        .collect::<Vec<_>>();
    tracing::trace!("existing classLoggers: {:?}", loggers);
    Ok(loggers)
}

/// A notification handler of the system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandler {
    pub id: Option<String>,
    pub name: String,
}

pub fn notification_handlers(document: &[u8]) -> Result<Vec<NotificationHandler>> {
    let root = xml::parse(document)?;
    let handlers = root
        .select("c:notificationConfiguration/c:handler", PREFIXES)
        .into_iter()
        .map(|handler| NotificationHandler {
            id: handler.attribute("id").map(str::to_string),
            name: child_text(handler, "name"),
        })
        .collect::<Vec<_>>();
    tracing::debug!("Existing handlers in notification configuration: {:?}", handlers);
    Ok(handlers)
}

/// Children that survive removing the entry whose `key` child equals `value`.
///
/// Returns one serialized child list per element matched by `parent_path`.
pub fn remaining_children(
    document: &[u8],
    parent_path: &str,
    child_path: &str,
    key_path: &str,
    value: &str,
) -> Result<Vec<Vec<String>>> {
    let root = xml::parse(document)?;
    let mut lists = Vec::new();
    for parent in root.select(parent_path, PREFIXES) {
        let mut remaining = Vec::new();
        for child in parent.select(child_path, PREFIXES) {
            let key = child.select(key_path, PREFIXES).first().map(|k| k.text());
            if key.as_deref() == Some(value) {
                tracing::debug!("Found matching {} with {}={}", child_path, key_path, value);
            } else {
                tracing::trace!("Keeping {} with {}={:?}", child_path, key_path, key);
                remaining.push(child.to_xml_string());
            }
        }
        lists.push(remaining);
    }
    Ok(lists)
}

fn child_text(element: &Element, name: &str) -> String {
    element
        .child(Some(COMMON_NS), name)
        .map(|e| e.text())
        .unwrap_or_default()
}
