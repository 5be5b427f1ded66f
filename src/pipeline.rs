//! Intake → dispatch → result validation pipeline
//!
//! [`Pipeline`] composes the three stages and short-circuits on the first
//! failure. It is stateless: one invocation per task, nothing retained, safe
//! to share behind an `Arc` across concurrent requests.

use crate::config::{ComputationEnv, DispatchConfig, PerformerConfig};
use crate::dispatch::{AzureOpenAiDispatcher, Dispatcher};
use crate::error::{PerformerError, PerformerResult};
use crate::intake::{DenylistScreen, IntakeValidator};
use crate::task::{Task, TaskResponse};
use crate::task_span;
use crate::verification::ResultValidator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Contract the external serving layer calls per inbound task
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run intake validation only
    fn validate_task(&self, task: &Task) -> PerformerResult<()>;

    /// Run the whole pipeline for one task
    async fn handle_task(&self, task: &Task) -> PerformerResult<TaskResponse>;
}

/// The three-stage performer pipeline
pub struct Pipeline<D: Dispatcher> {
    intake: IntakeValidator,
    dispatcher: D,
    results: ResultValidator,
}

impl<D: Dispatcher> Pipeline<D> {
    pub fn new(intake: IntakeValidator, dispatcher: D, results: ResultValidator) -> Self {
        Self {
            intake,
            dispatcher,
            results,
        }
    }

    pub fn intake(&self) -> &IntakeValidator {
        &self.intake
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn results(&self) -> &ResultValidator {
        &self.results
    }

    /// Execute the pipeline once for `task`
    pub async fn handle(&self, task: &Task) -> PerformerResult<TaskResponse> {
        let span = task_span!(task_id = %task.id_lossy(), payload_size = task.payload.len());

        async {
            info!("Handling task");

            let accepted = self.intake.validate(task).into_result()?;

            let raw = self.dispatcher.dispatch(&accepted).await.map_err(|e| {
                let error = PerformerError::from(e);
                error!(
                    error = %error.to_error_report().message,
                    dispatcher = self.dispatcher.name(),
                    "Computation dispatch failed"
                );
                error
            })?;

            let result = self.results.validate(&raw).into_result()?;

            info!(
                verified = result.verified,
                output_len = result.llm_output.len(),
                "Task handled successfully"
            );

            Ok::<_, PerformerError>(TaskResponse {
                task_id: task.id.clone(),
                result: raw,
            })
        }
        .instrument(span)
        .await
    }
}

impl Pipeline<AzureOpenAiDispatcher> {
    /// Assemble the production pipeline from file configuration and the
    /// captured environment
    ///
    /// An incomplete or insecure environment is a
    /// [`PerformerError::Configuration`].
    pub fn from_config(config: &PerformerConfig, env: ComputationEnv) -> PerformerResult<Self> {
        let dispatch_config = DispatchConfig::resolve(&config.computation, &env)?;
        let dispatcher = AzureOpenAiDispatcher::new(dispatch_config)?;

        Ok(Self::new(
            intake_from_config(config, env),
            dispatcher,
            ResultValidator::new(config.limits.max_result_bytes),
        ))
    }
}

/// Build the intake validator described by `config`
pub fn intake_from_config(config: &PerformerConfig, env: ComputationEnv) -> IntakeValidator {
    let screen = Arc::new(DenylistScreen::with_extra_patterns(
        &config.screen.extra_patterns,
    ));
    IntakeValidator::new(config.limits.max_payload_bytes, screen, env)
}

#[async_trait]
impl<D: Dispatcher> TaskHandler for Pipeline<D> {
    fn validate_task(&self, task: &Task) -> PerformerResult<()> {
        self.intake
            .validate(task)
            .into_result()
            .map(|_| ())
            .map_err(PerformerError::from)
    }

    async fn handle_task(&self, task: &Task) -> PerformerResult<TaskResponse> {
        self.handle(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComputationSection, ConfigurationError};
    use crate::testing::mocks::MockDispatcher;

    fn env() -> ComputationEnv {
        ComputationEnv::new(
            &ComputationSection::default(),
            Some("key".to_string()),
            Some("https://example.openai.azure.com/chat".to_string()),
        )
    }

    #[test]
    fn test_from_config_fails_without_credential() {
        let config = PerformerConfig::default();
        let env = ComputationEnv::new(&config.computation, None, None);
        assert!(matches!(
            Pipeline::from_config(&config, env),
            Err(PerformerError::Configuration(
                ConfigurationError::MissingCredential { .. }
            ))
        ));
    }

    #[test]
    fn test_from_config_applies_limits() {
        let mut config = PerformerConfig::default();
        config.limits.max_payload_bytes = 100;
        config.limits.max_result_bytes = 200;

        let pipeline = Pipeline::from_config(&config, env()).unwrap();
        assert_eq!(pipeline.intake().max_payload_bytes(), 100);
        assert_eq!(pipeline.results().max_result_bytes(), 200);
        assert_eq!(pipeline.dispatcher().name(), "azure-openai");
    }

    #[tokio::test]
    async fn test_validate_task_does_not_dispatch() {
        let dispatcher = MockDispatcher::with_output("this is valid");
        let pipeline = Pipeline::new(
            intake_from_config(&PerformerConfig::default(), env()),
            dispatcher.clone(),
            ResultValidator::default(),
        );

        assert!(pipeline.validate_task(&Task::new("t", "hello")).is_ok());
        assert_eq!(dispatcher.call_count(), 0);

        let response = pipeline.handle_task(&Task::new("t", "hello")).await.unwrap();
        assert_eq!(response.task_id_lossy(), "t");
        assert_eq!(dispatcher.call_count(), 1);
    }

    #[test]
    fn test_extra_patterns_reach_intake() {
        let mut config = PerformerConfig::default();
        config.screen.extra_patterns = vec!["sudo ".to_string()];
        let intake = intake_from_config(&config, env());

        let task = Task::new("t", "SUDO reboot");
        assert!(!intake.validate(&task).is_accepted());
    }
}
