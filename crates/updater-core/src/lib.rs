//! updater-core — the pieces that decide what a trigger request does.
//!
//! Validates the shared token in constant time and patches the target
//! deployment's pod template so the orchestrator rolls out new pods.
//!
//! # Components
//!
//! - **`auth`** — constant-time token check (`validate`, `check_token`)
//! - **`trigger`** — merge patch + generation comparison (`RolloutTrigger`)
//! - **`kube_patcher`** — `DeploymentPatcher` backed by a `kube::Client`
//! - **`error`** — `TriggerError`

pub mod auth;
pub mod error;
pub mod kube_patcher;
pub mod trigger;

pub use auth::{CredentialCheck, check_token, validate};
pub use error::{TriggerError, TriggerResult};
pub use kube_patcher::KubePatcher;
pub use trigger::{ANNOTATION_KEY, DeploymentPatcher, GenerationStatus, RolloutTrigger};
