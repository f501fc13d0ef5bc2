//! Cooperative wall-clock deadline for model fitting.

use std::time::{Duration, Instant};

use crate::error::ForecastError;

/// A wall-clock budget checked between fitting steps.
///
/// Fitting code cannot be preempted, so implementations call [`Deadline::check`]
/// between iterations and the selector checks once more after the fit returns.
/// An unbounded deadline never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Start a deadline of `budget` from now.
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            budget: None,
        }
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        match self.budget {
            Some(budget) => self.elapsed() > budget,
            None => false,
        }
    }

    /// `Err(DeadlineExceeded)` once the budget has run out.
    pub fn check(&self) -> Result<(), ForecastError> {
        match self.budget {
            Some(budget) if self.elapsed() > budget => Err(ForecastError::DeadlineExceeded {
                budget_ms: budget.as_millis() as u64,
                elapsed_ms: self.elapsed().as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generous_deadline_is_not_expired() {
        let deadline = Deadline::start(Duration::from_secs(30));
        assert!(!deadline.is_expired());
        assert!(deadline.check().is_ok());
        assert_eq!(deadline.budget(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_budget_expires() {
        let deadline = Deadline::start(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(deadline.is_expired());
        assert!(matches!(
            deadline.check(),
            Err(ForecastError::DeadlineExceeded { budget_ms: 0, .. })
        ));
    }

    #[test]
    fn test_unbounded_never_expires() {
        let deadline = Deadline::unbounded();
        assert!(!deadline.is_expired());
        assert!(deadline.check().is_ok());
        assert!(deadline.budget().is_none());
    }
}
