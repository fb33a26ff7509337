//! Integration tests for Reaper spec validation
//!
//! These tests verify that valid specs are accepted and that malformed or
//! option-like values are rejected before they reach the container argv.

mod common;

use kubescrub_operator::crd::ReaperSpec;
use kubescrub_operator::reconcilers::validate;

use common::demo_spec;

fn assert_rejected(spec: &ReaperSpec, needle: &str) {
    let result = validate(spec);
    assert!(result.is_err(), "spec should be rejected: {:?}", spec);
    let message = result.unwrap_err().to_string();
    assert!(
        message.contains(needle),
        "error '{}' should mention '{}'",
        message,
        needle
    );
}

// ============================================================================
// Accepted specs
// ============================================================================

#[test]
fn demo_spec_passes_validation() {
    let result = validate(&demo_spec());
    if let Err(e) = &result {
        panic!("Validation failed unexpectedly: {:?}", e);
    }
}

#[test]
fn qualified_resource_kinds_pass_validation() {
    let mut spec = demo_spec();
    spec.resources = "pods,deployments.apps,jobs.batch".to_string();
    spec.namespaces = "default,kube-system,team_a".to_string();
    spec.poll = "false".to_string();
    spec.poll_interval = "86400".to_string();

    assert!(validate(&spec).is_ok());
}

// ============================================================================
// Rejected specs
// ============================================================================

#[test]
fn empty_theme_fails_validation() {
    let mut spec = demo_spec();
    spec.theme = String::new();
    assert_rejected(&spec, "theme");
}

#[test]
fn option_like_theme_fails_validation() {
    let mut spec = demo_spec();
    spec.theme = "--kubeconfig=/etc/shadow".to_string();
    assert_rejected(&spec, "must not start with '-'");
}

#[test]
fn shell_metacharacters_fail_validation() {
    let values = ["pods;rm -rf /", "pods deployments", "$(id)", "pods|nodes"];

    for value in values {
        let mut spec = demo_spec();
        spec.resources = value.to_string();
        assert_rejected(&spec, "resources");
    }
}

#[test]
fn empty_list_item_fails_validation() {
    let mut spec = demo_spec();
    spec.namespaces = "default,".to_string();
    assert_rejected(&spec, "empty value");
}

#[test]
fn option_like_list_item_fails_validation() {
    let mut spec = demo_spec();
    spec.namespaces = "default,--all".to_string();
    assert_rejected(&spec, "namespaces");
}

#[test]
fn invalid_poll_flag_fails_validation() {
    for value in ["yes", "True", ""] {
        let mut spec = demo_spec();
        spec.poll = value.to_string();
        assert_rejected(&spec, "poll");
    }
}

#[test]
fn unparsable_poll_interval_fails_validation() {
    for value in ["soon", "-5", "1.5", ""] {
        let mut spec = demo_spec();
        spec.poll_interval = value.to_string();
        assert_rejected(&spec, "pollInterval");
    }
}

#[test]
fn out_of_range_poll_interval_fails_validation() {
    for value in ["0", "86401"] {
        let mut spec = demo_spec();
        spec.poll_interval = value.to_string();
        assert_rejected(&spec, "must be between 1 and 86400");
    }
}
