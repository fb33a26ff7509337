//! Child naming strategies

use kube::ResourceExt;

use crate::crd::Reaper;
use crate::error::{Error, Result};

/// Prefix for cluster-scoped children under per-parent naming
const CLUSTER_PREFIX: &str = "kubescrub";

/// Suffix of the primary children under per-parent naming
const PRIMARY_SUFFIX: &str = "scrub";

/// Suffix of the web children under both strategies
const WEB_SUFFIX: &str = "web";

/// How child resource names and namespaces are chosen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildNaming {
    /// Every parent maps to the same names. Only one Reaper per cluster is
    /// supported in this mode: a second Reaper resolves to the children the
    /// first one already owns.
    Fixed { name: String, namespace: String },
    /// Namespaced children are named after the parent and placed in its
    /// namespace; cluster-scoped children embed the parent's namespace.
    PerParent,
}

/// Resolved names for one parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildNames {
    primary: String,
    web: String,
    namespace: String,
    cluster: String,
}

impl ChildNames {
    /// Resolve names for the given parent.
    ///
    /// Under per-parent naming the primary and web children carry distinct
    /// suffixes, so `<a>-scrub` never equals `<b>-web`. Cluster-scoped names
    /// join namespace and name with `.`, which a namespace cannot contain.
    pub fn resolve(naming: &ChildNaming, parent: &Reaper) -> Result<Self> {
        match naming {
            ChildNaming::Fixed { name, namespace } => Ok(Self {
                primary: name.clone(),
                web: format!("{}-{}", name, WEB_SUFFIX),
                namespace: namespace.clone(),
                cluster: name.clone(),
            }),
            ChildNaming::PerParent => {
                let name = parent
                    .metadata
                    .name
                    .clone()
                    .ok_or(Error::MissingObjectKey(".metadata.name"))?;
                let namespace = parent
                    .namespace()
                    .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
                Ok(Self {
                    primary: format!("{}-{}", name, PRIMARY_SUFFIX),
                    web: format!("{}-{}", name, WEB_SUFFIX),
                    cluster: format!("{}.{}.{}", CLUSTER_PREFIX, namespace, name),
                    namespace,
                })
            }
        }
    }

    /// Name of the primary workload and everything named after it
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Name of the companion web workload
    pub fn web(&self) -> &str {
        &self.web
    }

    /// Name shared by the ClusterRole and ClusterRoleBinding
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Namespace for all namespaced children
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
