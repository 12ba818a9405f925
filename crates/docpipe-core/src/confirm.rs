//! Confirmation gate for destructive operations

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;

/// Asks the user to approve an action
///
/// Returning `false` cancels the action before any request is sent.
#[async_trait]
pub trait Confirmer: Send + Sync + fmt::Debug {
    /// Present `prompt` and wait for an answer
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer with a fixed answer that records the prompts it was shown
#[derive(Debug, Default)]
pub struct AutoConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl AutoConfirm {
    /// Always approve
    #[must_use]
    pub fn approve() -> Self {
        Self {
            answer: true,
            prompts: Mutex::default(),
        }
    }

    /// Always decline
    #[must_use]
    pub fn deny() -> Self {
        Self::default()
    }

    /// Prompts shown so far
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answer
    }
}
