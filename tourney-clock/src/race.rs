// First-settled race over the waits of one tick cycle.

use futures_util::future::{select_all, BoxFuture};

use crate::content::ContentOutcome;
use crate::listener::ListenOutcome;

/// Which wait settled first, and with what.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Listen(ListenOutcome),
    /// The current level's remaining time crossed a second boundary (or ran
    /// out).
    ClockTick,
    Content(ContentOutcome),
}

/// Resolve with the output of whichever wait settles first, success or
/// failure alike. The losers are dropped; anything they own that must outlive
/// the race has to live outside the future. Returns `None` for an empty set.
pub async fn first_settled<'a, T>(waits: Vec<BoxFuture<'a, T>>) -> Option<T> {
    if waits.is_empty() {
        return None;
    }
    let (output, _index, _rest) = select_all(waits).await;
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn earliest_wait_wins() {
        let waits: Vec<BoxFuture<'_, Settled>> = vec![
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Settled::Listen(ListenOutcome::TimedOut)
            }
            .boxed(),
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Settled::ClockTick
            }
            .boxed(),
        ];
        assert_eq!(first_settled(waits).await, Some(Settled::ClockTick));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_settles_the_race_too() {
        let waits: Vec<BoxFuture<'_, Settled>> = vec![
            std::future::pending().boxed(),
            async { Settled::Listen(ListenOutcome::Failed("connection refused".into())) }.boxed(),
        ];
        assert!(matches!(
            first_settled(waits).await,
            Some(Settled::Listen(ListenOutcome::Failed(_)))
        ));
    }

    #[tokio::test]
    async fn empty_race_settles_nothing() {
        let waits: Vec<BoxFuture<'_, Settled>> = Vec::new();
        assert_eq!(first_settled(waits).await, None);
    }
}
