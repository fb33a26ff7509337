use std::collections::BTreeMap;

/// Value of the `app` label on the primary workload
pub const APP_NAME: &str = "kubescrub";

/// Label key carrying the owning Reaper's name
pub const CR_LABEL: &str = "kubescrub_cr";

/// Labels for the primary workload, its Service and the RBAC objects
pub fn primary_labels(parent_name: &str) -> BTreeMap<String, String> {
    labels(APP_NAME.to_string(), parent_name)
}

/// Labels for the web workload and its Service
pub fn web_labels(parent_name: &str) -> BTreeMap<String, String> {
    labels(format!("{}-web", APP_NAME), parent_name)
}

fn labels(app: String, parent_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), app),
        (CR_LABEL.to_string(), parent_name.to_string()),
    ])
}
