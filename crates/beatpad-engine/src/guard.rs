//! Stale-response suppression.
//!
//! Each interaction channel owns a guard. Issuing a request mints a token that
//! is strictly greater than every earlier one; a completion may only touch
//! shared state while its token is still the latest.

use std::cell::Cell;

use serde::Serialize;

/// A monotonically increasing request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues tokens and answers whether a token is still current.
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: Cell<u64>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token, superseding every earlier one.
    pub fn issue(&self) -> RequestToken {
        let next = self.latest.get() + 1;
        self.latest.set(next);
        RequestToken(next)
    }

    /// The most recently issued token value (0 before the first issue).
    pub fn latest(&self) -> u64 {
        self.latest.get()
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest.get()
    }

    /// Runs `apply` only if `token` is still current.
    pub fn apply_if_current<T>(&self, token: RequestToken, apply: impl FnOnce() -> T) -> Option<T> {
        if self.is_current(token) {
            Some(apply())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_token_supersedes_earlier() {
        let guard = RequestGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert!(second > first);
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert_eq!(guard.latest(), second.value());
    }

    #[test]
    fn test_out_of_order_completion_is_dropped() {
        let guard = RequestGuard::new();
        let mut applied = Vec::new();
        let five = guard.issue();
        let six = guard.issue();
        // token 6 completes first, then token 5
        guard.apply_if_current(six, || applied.push(6));
        guard.apply_if_current(five, || applied.push(5));
        assert_eq!(applied, vec![6]);
    }
}
