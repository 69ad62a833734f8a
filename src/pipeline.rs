//! Sequential step runner.
//!
//! Steps run in order until one halts. Afterwards every step that ran,
//! including the one that halted, is cleaned up in reverse order.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::{debug, info};

use crate::state::BuildContext;

/// Future returned by step operations.
pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Signal returned by [`Step::run`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepAction {
    /// Proceed with the next step.
    Continue,
    /// Stop the pipeline; the step has recorded its error in the state.
    Halt,
}

/// When the runner invokes [`Step::cleanup`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CleanupPolicy {
    /// Clean up after every run.
    #[default]
    Always,
    /// Clean up only when a step halted, keeping resources of a successful build.
    OnFailure,
}

/// One stage of a build.
pub trait Step: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Performs the step, recording any failure in the context before halting.
    fn run<'a>(&'a mut self, ctx: &'a mut BuildContext) -> StepFuture<'a, StepAction>;

    /// Releases whatever the step created; must not fail the build.
    fn cleanup<'a>(&'a mut self, ctx: &'a BuildContext) -> StepFuture<'a, ()>;
}

/// Errors returned by [`run_steps`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PipelineError {
    /// A step halted the build.
    #[error("step {step} halted the build: {message}")]
    Halted {
        /// Name of the halting step.
        step: String,
        /// Error recorded by the step.
        message: String,
    },
}

/// Runs `steps` in order and cleans up according to `policy`.
///
/// # Errors
///
/// Returns [`PipelineError::Halted`] when a step halts.
pub async fn run_steps(
    steps: &mut [Box<dyn Step>],
    ctx: &mut BuildContext,
    policy: CleanupPolicy,
) -> Result<(), PipelineError> {
    let mut ran = 0;
    let mut halted_by = None;

    for step in steps.iter_mut() {
        info!(step = step.name(), "running step");
        ran += 1;
        if step.run(ctx).await == StepAction::Halt {
            halted_by = Some(step.name());
            break;
        }
    }

    if halted_by.is_some() || policy == CleanupPolicy::Always {
        for step in steps.iter_mut().take(ran).rev() {
            debug!(step = step.name(), "cleaning up step");
            step.cleanup(ctx).await;
        }
    }

    match halted_by {
        Some(step) => Err(PipelineError::Halted {
            step: step.to_owned(),
            message: ctx
                .state
                .error
                .clone()
                .unwrap_or_else(|| String::from("no error recorded")),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;
    use crate::config::ServerConfig;
    use crate::test_support::{RecordingUi, ScriptedApi};

    struct ProbeStep {
        name: &'static str,
        action: StepAction,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl ProbeStep {
        fn boxed(
            name: &'static str,
            action: StepAction,
            journal: &Arc<Mutex<Vec<String>>>,
        ) -> Box<dyn Step> {
            Box::new(Self {
                name,
                action,
                journal: Arc::clone(journal),
            })
        }

        fn note(&self, entry: String) {
            self.journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry);
        }
    }

    impl Step for ProbeStep {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run<'a>(&'a mut self, ctx: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
            Box::pin(async move {
                self.note(format!("run {}", self.name));
                if self.action == StepAction::Halt {
                    ctx.halt_with(format!("{} failed", self.name));
                }
                self.action
            })
        }

        fn cleanup<'a>(&'a mut self, _ctx: &'a BuildContext) -> StepFuture<'a, ()> {
            Box::pin(async move { self.note(format!("cleanup {}", self.name)) })
        }
    }

    fn context() -> BuildContext {
        BuildContext::new(
            Arc::new(ScriptedApi::new()),
            Arc::new(RecordingUi::new()),
            ServerConfig::default(),
            1,
        )
    }

    fn entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[tokio::test]
    async fn halting_step_stops_run_and_cleans_up_in_reverse() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut steps = vec![
            ProbeStep::boxed("first", StepAction::Continue, &journal),
            ProbeStep::boxed("second", StepAction::Halt, &journal),
            ProbeStep::boxed("third", StepAction::Continue, &journal),
        ];
        let mut ctx = context();

        let err = run_steps(&mut steps, &mut ctx, CleanupPolicy::OnFailure)
            .await
            .expect_err("second step halts");

        assert_eq!(
            err,
            PipelineError::Halted {
                step: String::from("second"),
                message: String::from("second failed"),
            }
        );
        assert_eq!(
            entries(&journal),
            vec!["run first", "run second", "cleanup second", "cleanup first"]
        );
    }

    #[tokio::test]
    async fn on_failure_policy_keeps_successful_builds() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut steps = vec![ProbeStep::boxed("only", StepAction::Continue, &journal)];
        let mut ctx = context();

        run_steps(&mut steps, &mut ctx, CleanupPolicy::OnFailure)
            .await
            .expect("pipeline succeeds");
        assert_eq!(entries(&journal), vec!["run only"]);

        run_steps(&mut steps, &mut ctx, CleanupPolicy::Always)
            .await
            .expect("pipeline succeeds");
        assert_eq!(
            entries(&journal),
            vec!["run only", "run only", "cleanup only"]
        );
    }
}
