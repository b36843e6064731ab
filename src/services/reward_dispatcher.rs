use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::models::RewardJob;
use crate::repositories::{RepositoryError, RewardRepository};
use crate::services::retry::{retry_with_backoff, RetryPolicy};

/// Receives successful check-ins. Implementations must never fail the caller.
#[cfg_attr(test, mockall::automock)]
pub trait RewardSink: Send + Sync {
    fn on_attendance_recorded(&self, user_id: i64, workshop_id: i64, workshop_title: &str);
}

/// Hands reward jobs to a background worker over a bounded channel.
///
/// The request path only calls `try_send`. A full or closed queue drops the
/// job with an `error!` line carrying what is needed to replay it.
#[derive(Clone)]
pub struct RewardDispatcher {
    sender: mpsc::Sender<RewardJob>,
    amount: i64,
}

impl RewardDispatcher {
    /// Starts the worker on the current runtime. The worker exits once every
    /// dispatcher clone has been dropped and the queue is drained.
    pub fn spawn(
        repository: Arc<dyn RewardRepository>,
        policy: RetryPolicy,
        capacity: usize,
        amount: i64,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(repository, policy, receiver));

        (Self { sender, amount }, handle)
    }
}

impl RewardSink for RewardDispatcher {
    fn on_attendance_recorded(&self, user_id: i64, workshop_id: i64, workshop_title: &str) {
        let job = RewardJob {
            user_id,
            workshop_id,
            workshop_title: workshop_title.to_string(),
            amount: self.amount,
        };

        match self.sender.try_send(job) {
            Ok(()) => {
                tracing::debug!(user_id, workshop_id, "Queued check-in reward");
            }
            Err(TrySendError::Full(job)) => {
                tracing::error!(
                    user_id = job.user_id,
                    workshop_id = job.workshop_id,
                    amount = job.amount,
                    "Reward queue full; reward dropped"
                );
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!(
                    user_id = job.user_id,
                    workshop_id = job.workshop_id,
                    amount = job.amount,
                    "Reward worker stopped; reward dropped"
                );
            }
        }
    }
}

async fn run_worker(
    repository: Arc<dyn RewardRepository>,
    policy: RetryPolicy,
    mut receiver: mpsc::Receiver<RewardJob>,
) {
    tracing::info!("Reward worker started");

    while let Some(job) = receiver.recv().await {
        apply_reward(repository.as_ref(), &policy, &job).await;
    }

    tracing::info!("Reward worker stopped");
}

/// Applies one job with retries. Returns whether XP was credited by this call.
pub async fn apply_reward(
    repository: &dyn RewardRepository,
    policy: &RetryPolicy,
    job: &RewardJob,
) -> bool {
    let outcome = retry_with_backoff(
        policy,
        || repository.record_reward(job),
        |err| matches!(err, RepositoryError::Database(_)),
    )
    .await;

    match outcome {
        Ok(true) => {
            tracing::info!(
                user_id = job.user_id,
                workshop_id = job.workshop_id,
                amount = job.amount,
                "Awarded check-in XP"
            );
            true
        }
        Ok(false) => {
            tracing::debug!(
                user_id = job.user_id,
                workshop_id = job.workshop_id,
                "Reward already recorded"
            );
            false
        }
        Err(err) => {
            tracing::error!(
                user_id = job.user_id,
                workshop_id = job.workshop_id,
                amount = job.amount,
                error = %err,
                "Failed to apply check-in reward; replay required"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::reward_repository::MockRewardRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn job() -> RewardJob {
        RewardJob {
            user_id: 5,
            workshop_id: 9,
            workshop_title: "Ownership Deep Dive".to_string(),
            amount: 100,
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(max_retries)
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(2))
            .build()
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut repository = MockRewardRepository::new();
        repository.expect_record_reward().times(2).returning(move |_| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt == 0 {
                    Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
                } else {
                    Ok(true)
                }
            })
        });

        let applied = apply_reward(&repository, &fast_policy(3), &job()).await;

        assert!(applied);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_user_is_not_retried() {
        let mut repository = MockRewardRepository::new();
        repository
            .expect_record_reward()
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::NotFound) }));

        assert!(!apply_reward(&repository, &fast_policy(3), &job()).await);
    }

    #[tokio::test]
    async fn exhausted_retries_give_up() {
        let mut repository = MockRewardRepository::new();
        repository.expect_record_reward().times(3).returning(|_| {
            Box::pin(async move { Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)) })
        });

        assert!(!apply_reward(&repository, &fast_policy(2), &job()).await);
    }

    #[tokio::test]
    async fn worker_drains_queue_before_exiting() {
        let mut repository = MockRewardRepository::new();
        repository
            .expect_record_reward()
            .withf(|job: &RewardJob| job.user_id == 5 && job.amount == 100)
            .times(1)
            .returning(|_| Box::pin(async move { Ok(true) }));

        let (dispatcher, handle) =
            RewardDispatcher::spawn(Arc::new(repository), fast_policy(0), 8, 100);

        dispatcher.on_attendance_recorded(5, 9, "Ownership Deep Dive");
        drop(dispatcher);

        handle.await.expect("worker exits cleanly");
    }

    #[tokio::test]
    async fn closed_queue_does_not_panic() {
        let repository = MockRewardRepository::new();
        let (dispatcher, handle) =
            RewardDispatcher::spawn(Arc::new(repository), fast_policy(0), 1, 100);

        handle.abort();
        let _ = handle.await;

        dispatcher.on_attendance_recorded(5, 9, "Ownership Deep Dive");
    }
}
