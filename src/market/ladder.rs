//! Short-circuiting runner for ordered degradation ladders.
//!
//! A ladder is a sequence of increasingly relaxed query attempts. Each
//! attempt yields a tagged outcome: success wins the ladder immediately, a
//! soft failure moves on to the next rung, a hard failure aborts the whole
//! ladder (nothing later in the sequence could succeed either, e.g. missing
//! credentials). The winner is always the first rung to succeed in ladder
//! order — determinism and explainability over raw speed.

use std::fmt::Display;
use std::future::Future;

/// Outcome of one ladder rung.
pub enum Attempt<T> {
    Success(T),
    /// This rung produced nothing usable; try the next one.
    Soft(String),
    /// No rung can succeed; abort.
    Hard(anyhow::Error),
}

/// Run `attempt` over `stages` in order, returning the first success together
/// with the stage that produced it.
pub async fn run_ladder<S, T, F, Fut>(stages: Vec<S>, mut attempt: F) -> anyhow::Result<Option<(S, T)>>
where
    S: Clone + Display,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for stage in stages {
        match attempt(stage.clone()).await {
            Attempt::Success(value) => {
                tracing::debug!(stage = %stage, "ladder rung succeeded");
                return Ok(Some((stage, value)));
            }
            Attempt::Soft(reason) => {
                tracing::debug!(stage = %stage, reason, "ladder rung soft-failed");
            }
            Attempt::Hard(error) => {
                tracing::warn!(stage = %stage, "ladder aborted: {error:#}");
                return Err(error);
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_success_in_order_wins() {
        let result = run_ladder(vec!["a", "b", "c"], |stage| async move {
            match stage {
                "b" => Attempt::Success(2),
                "c" => Attempt::Success(3),
                _ => Attempt::Soft("no data".into()),
            }
        })
        .await
        .unwrap();

        let (stage, value) = result.unwrap();
        assert_eq!(stage, "b");
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn all_soft_failures_yield_none() {
        let result: Option<(&str, ())> = run_ladder(vec!["a", "b"], |_| async {
            Attempt::Soft("empty".into())
        })
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn hard_failure_aborts_immediately() {
        let mut attempts = 0;
        let result: anyhow::Result<Option<(&str, ())>> = run_ladder(vec!["a", "b"], |_| {
            attempts += 1;
            async { Attempt::Hard(anyhow::anyhow!("credentials not set")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn later_rungs_are_not_attempted_after_a_win() {
        let mut attempts = 0;
        let _ = run_ladder(vec![1, 2, 3], |stage| {
            attempts += 1;
            async move {
                if stage == 1 {
                    Attempt::Success(stage)
                } else {
                    Attempt::Soft("unreachable".into())
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(attempts, 1);
    }
}
