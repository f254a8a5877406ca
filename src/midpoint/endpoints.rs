//! Object type to REST collection mapping

use crate::error::{MidpointError, Result};

/// Object class name and the REST collection serving it.
///
/// Order matters: resolution returns the first entry whose key starts with
/// the requested name.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("AccessCertificationDefinitionType", "accessCertificationDefinitions"),
    ("ArchetypeType", "archetypes"),
    ("ConnectorHostType", "connectorHosts"),
    ("ConnectorType", "connectors"),
    ("FunctionLibraryType", "functionLibraries"),
    ("GenericObjectType", "genericObjects"),
    ("ObjectCollectionType", "objectCollections"),
    ("ObjectTemplateType", "objectTemplates"),
    ("OrgType", "orgs"),
    ("ResourceType", "resources"),
    ("RoleType", "roles"),
    ("SecurityPolicyType", "securityPolicies"),
    ("ShadowType", "shadows"),
    ("SystemConfigurationType", "systemConfigurations"),
    ("TaskType", "tasks"),
    ("UserType", "users"),
    ("ValuePolicyType", "valuePolicies"),
];

/// Resolve the REST collection for an object type name (case-insensitive prefix)
pub fn resolve_endpoint(object_type: &str) -> Result<&'static str> {
    let wanted = object_type.to_lowercase();
    ENDPOINTS
        .iter()
        .find(|(class, _)| class.to_lowercase().starts_with(&wanted))
        .map(|(_, rest)| *rest)
        .ok_or_else(|| MidpointError::UnknownObjectType(object_type.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_class_names() {
        assert_eq!(resolve_endpoint("RoleType").unwrap(), "roles");
        assert_eq!(resolve_endpoint("UserType").unwrap(), "users");
        assert_eq!(
            resolve_endpoint("SystemConfigurationType").unwrap(),
            "systemConfigurations"
        );
    }

    #[test]
    fn test_case_insensitive_prefix() {
        assert_eq!(resolve_endpoint("roleType").unwrap(), "roles");
        assert_eq!(resolve_endpoint("role").unwrap(), "roles");
        assert_eq!(resolve_endpoint("TASK").unwrap(), "tasks");
    }

    #[test]
    fn test_first_match_wins() {
        // "Connector" prefixes both ConnectorHostType and ConnectorType
        assert_eq!(resolve_endpoint("Connector").unwrap(), "connectorHosts");
        assert_eq!(resolve_endpoint("ConnectorT").unwrap(), "connectors");
    }

    #[test]
    fn test_unknown_type() {
        let err = resolve_endpoint("FocusType").unwrap_err();
        assert!(matches!(err, MidpointError::UnknownObjectType(ref t) if t == "FocusType"));
        assert!(resolve_endpoint("RoleTypes").is_err());
    }
}
