//! Kubescrub Kubernetes Operator
//!
//! This operator reconciles `Reaper` custom resources into the Deployments,
//! Services, RBAC objects and Ingress that run the Kubescrub workload.

pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;
pub mod resources;
pub mod store;

pub use error::{Error, Result};
