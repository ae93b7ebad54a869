//! Collaborator seams for the session state machine.
//!
//! `ContentProvider` is implemented by the `ieltsim-providers` crate;
//! `ConfirmGate` is implemented by whatever front end drives the session.

use async_trait::async_trait;

use crate::model::{Test, WritingFeedback, WritingSubmission};

/// External service that generates tests and grades writing submissions.
///
/// Both operations are opaque network boundaries: slow, fallible, and
/// non-deterministic. The session machine owns the failure policy.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Produce a complete test. The request shape is fixed; the returned
    /// payload is still subject to contract validation by the caller.
    async fn generate_test(&self) -> anyhow::Result<Test>;

    /// Grade a finalized writing submission.
    async fn grade_writing(&self, submission: &WritingSubmission)
        -> anyhow::Result<WritingFeedback>;
}

/// Interactive confirmation capability.
///
/// The session machine asks before finalizing an incomplete submission;
/// presentation layers answer however they like (dialog, prompt, policy).
#[async_trait]
pub trait ConfirmGate: Send + Sync {
    /// Return `true` to proceed, `false` to stay in the current phase.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Gate that always proceeds. Suits non-interactive front ends.
pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmGate for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
