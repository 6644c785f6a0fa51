//! Composite unbind handle

use eventbind_events::SubscriptionToken;
use tracing::debug;

/// Whether a handle currently holds live subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
}

/// Every subscription made by one bind pass.
///
/// `unbind` removes them in the order they were made and empties the
/// handle, so calling it again is a no-op. Dropping the handle leaves the
/// subscriptions in place.
#[derive(Debug, Default)]
pub struct BindingHandle {
    tokens: Vec<SubscriptionToken>,
}

impl BindingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: SubscriptionToken) {
        self.tokens.push(token);
    }

    /// Remove every subscription held by this handle
    pub fn unbind(&mut self) {
        if self.tokens.is_empty() {
            return;
        }

        let count = self.tokens.len();
        for token in self.tokens.drain(..) {
            token.remove();
        }
        debug!(subscriptions = count, "Unbound event handlers");
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn state(&self) -> BindingState {
        if self.tokens.is_empty() {
            BindingState::Unbound
        } else {
            BindingState::Bound
        }
    }

    pub fn tokens(&self) -> &[SubscriptionToken] {
        &self.tokens
    }
}
