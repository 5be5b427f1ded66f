//! LLM task performer
//!
//! Intake validation, computation dispatch and result validation for a single
//! worker node. An upstream distributor hands the worker a [`Task`]; the
//! [`Pipeline`] screens it, sends the prompt to an Azure OpenAI deployment,
//! checks the output contract, and returns a [`TaskResponse`] or a typed
//! [`PerformerError`].
//!
//! # Overview
//!
//! - [`intake`]: structural checks and the best-effort [`ContentScreen`]
//! - [`dispatch`]: the [`Dispatcher`] seam and the HTTPS dispatcher
//! - [`verification`]: the result contract checks
//! - [`pipeline`]: stage composition and the [`TaskHandler`] serving contract
//!
//! # Quick Start
//!
//! ```rust
//! use llm_performer::config::{ComputationEnv, PerformerConfig};
//! use llm_performer::pipeline::intake_from_config;
//! use llm_performer::task::Task;
//!
//! let config = PerformerConfig::default();
//! let env = ComputationEnv::new(
//!     &config.computation,
//!     Some("api-key".to_string()),
//!     Some("https://example.openai.azure.com/openai/deployments/gpt/chat/completions".to_string()),
//! );
//! let intake = intake_from_config(&config, env);
//!
//! let task = Task::new("task-2", "<script>alert(1)</script>");
//! let outcome = intake.validate(&task);
//! assert!(!outcome.is_accepted());
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod intake;
pub mod observability;
pub mod pipeline;
pub mod task;
pub mod testing;
pub mod verification;

pub use config::{
    ComputationEnv, ConfigError, ConfigurationError, DispatchConfig, PerformerConfig,
};
pub use dispatch::{AzureOpenAiDispatcher, DispatchError, Dispatcher};
pub use error::{ErrorKind, ErrorReport, PerformerError, PerformerResult};
pub use intake::{ContentScreen, DenylistScreen, IntakeRejection, IntakeValidator, TaskRejection};
pub use pipeline::{Pipeline, TaskHandler};
pub use task::{AcceptedTask, ComputationResult, Task, TaskResponse, ValidationOutcome};
pub use verification::{ResultRejection, ResultValidator};
