//! BDD scenarios for the provisioning pipeline.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Create a server from a named image"
)]
fn scenario_create_from_named_image(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Upgrade the server type after creation"
)]
fn scenario_upgrade_server_type(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Boot the server into a rescue system"
)]
fn scenario_boot_rescue(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Select the newest image by label"
)]
fn scenario_select_newest_image(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "An unknown SSH key halts the build before creation"
)]
fn scenario_unknown_ssh_key(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "A failed creation action still deletes the server"
)]
fn scenario_failed_creation_action(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Keep the server after a successful build"
)]
fn scenario_keep_server(provision_context: ProvisionContext) {
    let _ = provision_context;
}
