//! BDD step definitions for provisioning behaviour.

use hcloud_builder::test_support::{ApiCall, SCRIPTED_SERVER_ID, UiEvent, image};
use hcloud_builder::{CleanupPolicy, ImageFilter};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{ProvisionContext, ProvisionOutcome, run_pipeline, template};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("scenario setup failed: {0}")]
    Setup(#[from] std::io::Error),
    #[error("invalid image timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a build template for server type \"{server_type}\" using image \"{image_name}\"")]
fn template_with_image(
    mut provision_context: ProvisionContext,
    server_type: String,
    image_name: String,
) -> ProvisionContext {
    provision_context.config = hcloud_builder::ServerConfig {
        image: Some(image_name),
        ..template(&server_type)
    };
    provision_context
}

#[given(
    "a build template for server type \"{server_type}\" selecting the newest image labelled \"{selector}\""
)]
fn template_with_selector(
    mut provision_context: ProvisionContext,
    server_type: String,
    selector: String,
) -> ProvisionContext {
    provision_context.config = hcloud_builder::ServerConfig {
        image_filter: ImageFilter {
            with_selector: vec![selector],
            most_recent: true,
        },
        ..template(&server_type)
    };
    provision_context
}

#[given("the template upgrades the server type to \"{target}\"")]
fn template_upgrades(mut provision_context: ProvisionContext, target: String) -> ProvisionContext {
    provision_context.config.upgrade_server_type = Some(target);
    provision_context
}

#[given("the template enables the rescue system \"{rescue}\"")]
fn template_rescue(mut provision_context: ProvisionContext, rescue: String) -> ProvisionContext {
    provision_context.config.rescue_mode = Some(rescue);
    provision_context
}

#[given("the template requires the SSH key \"{key}\"")]
fn template_requires_key(mut provision_context: ProvisionContext, key: String) -> ProvisionContext {
    provision_context.config.ssh_keys.push(key);
    provision_context
}

#[given("the provider offers images \"{older}\" and \"{newer}\"")]
fn provider_offers_images(
    provision_context: ProvisionContext,
    older: String,
    newer: String,
) -> Result<ProvisionContext, StepError> {
    provision_context.api.set_images(vec![
        image(1, &older, "2024-01-01T00:00:00Z")?,
        image(2, &newer, "2024-06-01T00:00:00Z")?,
    ]);
    Ok(provision_context)
}

#[given("the provider fails the \"{command}\" action")]
fn provider_fails_action(provision_context: ProvisionContext, command: String) -> ProvisionContext {
    provision_context.api.fail_action(&command);
    provision_context
}

#[when("I run the provisioning pipeline")]
fn run_with_cleanup(mut provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    provision_context.outcome = Some(run_pipeline(&provision_context, CleanupPolicy::Always)?);
    Ok(provision_context)
}

#[when("I run the provisioning pipeline keeping the server")]
fn run_keeping_server(
    mut provision_context: ProvisionContext,
) -> Result<ProvisionContext, StepError> {
    provision_context.outcome = Some(run_pipeline(&provision_context, CleanupPolicy::OnFailure)?);
    Ok(provision_context)
}

#[then("the build succeeds with the scripted server")]
fn build_succeeds(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match provision_context.outcome.as_ref() {
        Some(ProvisionOutcome::Success(state)) if state.server_id == Some(SCRIPTED_SERVER_ID) => {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected success with server {SCRIPTED_SERVER_ID}, got {other:?}"
        ))),
    }
}

#[then("the build fails with \"{prefix}\"")]
fn build_fails(provision_context: &ProvisionContext, prefix: String) -> Result<(), StepError> {
    match provision_context.outcome.as_ref() {
        Some(ProvisionOutcome::Failure(message)) if message.starts_with(prefix.as_str()) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure starting with {prefix:?}, got {other:?}"
        ))),
    }
}

#[then("the server was created with image \"{image_name}\"")]
fn created_with_image(
    provision_context: &ProvisionContext,
    image_name: String,
) -> Result<(), StepError> {
    let created = provision_context
        .api
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ApiCall::CreateServer(opts) => Some(opts),
            _ => None,
        })
        .ok_or_else(|| StepError::Assertion(String::from("no server was created")))?;
    let expected = hcloud_builder::hcloud::types::ImageRef::Name(image_name);
    if created.image == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected image {expected:?}, got {:?}",
            created.image
        )))
    }
}

#[then("the server was created powered off")]
fn created_powered_off(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let powered_off = provision_context.api.calls().iter().any(|call| {
        matches!(call, ApiCall::CreateServer(opts) if opts.start_after_create == Some(false))
    });
    if powered_off {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "expected the server to be created without starting",
        )))
    }
}

#[then("the provider calls were \"{calls}\"")]
fn provider_calls(provision_context: &ProvisionContext, calls: String) -> Result<(), StepError> {
    let expected: Vec<&str> = calls.split(',').map(str::trim).collect();
    let observed = provision_context.api.call_labels();
    if observed == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected calls {expected:?}, got {observed:?}"
        )))
    }
}

#[then("server deletions total {count:usize}")]
fn deletions_total(provision_context: &ProvisionContext, count: usize) -> Result<(), StepError> {
    let observed = provision_context.api.count("delete_server");
    if observed == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} deletions, got {observed}"
        )))
    }
}

#[then("the UI reported \"{message}\"")]
fn ui_reported(provision_context: &ProvisionContext, message: String) -> Result<(), StepError> {
    if provision_context
        .ui
        .events()
        .contains(&UiEvent::Message(message.clone()))
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected UI message {message:?}, got {:?}",
            provision_context.ui.events()
        )))
    }
}
