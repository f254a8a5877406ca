//! Assignments and inducements

use super::client::{MidpointClient, ObjectRef};
use super::delta::{relationship_delta, RelationshipKind};
use super::document;
use super::endpoints::resolve_endpoint;
use crate::error::Result;

/// Outcome of a relationship request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The target was patched
    Added,
    /// The source oid already appears in the target document
    AlreadyLinked,
}

impl MidpointClient {
    /// Link `source` into the `kind` container of `target`.
    ///
    /// Both ends are awaited first. The existing-link check is a plain
    /// substring search for the source oid in the serialized target, so an
    /// oid that happens to be contained in another value of the target reads
    /// as already linked.
    pub async fn add_assignment_or_inducement(
        &self,
        kind: RelationshipKind,
        source_type: &str,
        source: &ObjectRef,
        target_type: &str,
        target: &ObjectRef,
    ) -> Result<LinkOutcome> {
        tracing::trace!(
            "add {} source_type={}, source={}, target_type={}, target={}",
            kind,
            source_type,
            source,
            target_type,
            target
        );

        let poller = self.polling.relationship;
        self.wait_for_object(&poller, source_type, source).await?;
        self.wait_for_object(&poller, target_type, target).await?;

        let source_oid = self.resolve_oid(source_type, source).await?;
        let target_object = self.get_object_by_ref(target_type, target).await?;
        let target_oid = match target {
            ObjectRef::Oid(oid) => oid.clone(),
            ObjectRef::Name(_) => document::oid_of(&target_object)?,
        };

        tracing::debug!(
            "Checking if {} already exists from {} {} to {} {}",
            kind,
            source_type,
            source_oid,
            target_type,
            target_oid
        );
        if String::from_utf8_lossy(&target_object).contains(source_oid.as_str()) {
            tracing::debug!("Relationship ({}) already exists", kind);
            return Ok(LinkOutcome::AlreadyLinked);
        }

        tracing::info!(
            "Adding {} {} {} to {} {}",
            kind,
            source_type,
            source_oid,
            target_type,
            target_oid
        );
        let delta = relationship_delta(kind, source_type, &source_oid)?;
        let endpoint = resolve_endpoint(target_type)?;
        self.patch_object(&delta.to_xml(), endpoint, &target_oid)
            .await?;
        Ok(LinkOutcome::Added)
    }

    pub async fn add_resource_inducement_to_role(
        &self,
        resource: &ObjectRef,
        role: &ObjectRef,
    ) -> Result<LinkOutcome> {
        self.add_assignment_or_inducement(
            RelationshipKind::Inducement,
            "ResourceType",
            resource,
            "RoleType",
            role,
        )
        .await
    }

    pub async fn add_role_inducement_to_role(
        &self,
        child: &ObjectRef,
        parent: &ObjectRef,
    ) -> Result<LinkOutcome> {
        self.add_assignment_or_inducement(
            RelationshipKind::Inducement,
            "RoleType",
            child,
            "RoleType",
            parent,
        )
        .await
    }

    pub async fn add_role_inducement_to_archetype(
        &self,
        role: &ObjectRef,
        archetype: &ObjectRef,
    ) -> Result<LinkOutcome> {
        self.add_assignment_or_inducement(
            RelationshipKind::Inducement,
            "RoleType",
            role,
            "ArchetypeType",
            archetype,
        )
        .await
    }

    pub async fn add_role_assignment_to_user(
        &self,
        role: &ObjectRef,
        user: &ObjectRef,
    ) -> Result<LinkOutcome> {
        self.add_assignment_or_inducement(
            RelationshipKind::Assignment,
            "RoleType",
            role,
            "UserType",
            user,
        )
        .await
    }
}
