//! Owner-reference linking
//!
//! Every child carries exactly one controller reference back to its Reaper
//! so the garbage collector removes it when the Reaper is deleted.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};

use super::{ChildKind, DesiredChild};
use crate::crd::Reaper;
use crate::error::{Error, Result};

/// Stamp `child` with a controller owner reference to `parent`.
///
/// Namespaced children must live in the parent's namespace. Cluster-scoped
/// children are exempt from that check but are still linked.
pub fn link(parent: &Reaper, child: DesiredChild) -> Result<DesiredChild> {
    let owner = parent
        .controller_owner_ref(&())
        .ok_or(Error::MissingObjectKey(".metadata.uid"))?;

    if !child.kind.is_cluster_scoped() {
        let parent_ns = parent.namespace();
        let child_ns = child.resource.meta().namespace.clone();
        if parent_ns != child_ns {
            return Err(Error::ownership(format!(
                "{} {} is in namespace {} but Reaper {} is in namespace {}",
                child.kind.api_kind(),
                child.resource.name(),
                child_ns.as_deref().unwrap_or("<none>"),
                parent.name_any(),
                parent_ns.as_deref().unwrap_or("<none>"),
            )));
        }
    }

    let DesiredChild { kind, mut resource } = child;
    resource.meta_mut().owner_references = Some(vec![owner]);
    Ok(DesiredChild { kind, resource })
}

/// Check that an existing child is not controlled by another object.
///
/// Children without a controller reference are left as they are. A child
/// controlled by anything other than `parent` is an ownership conflict.
pub fn verify_owner(parent: &Reaper, kind: ChildKind, existing: &ObjectMeta) -> Result<()> {
    let Some(controller) = existing
        .owner_references
        .iter()
        .flatten()
        .find(|r| r.controller == Some(true))
    else {
        return Ok(());
    };

    if parent.uid().as_deref() == Some(controller.uid.as_str()) {
        return Ok(());
    }

    Err(Error::ownership(format!(
        "{} {} is controlled by {} {}, not Reaper {}",
        kind.api_kind(),
        existing.name.as_deref().unwrap_or("<unnamed>"),
        controller.kind,
        controller.name,
        parent.name_any(),
    )))
}
