use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::repositories;

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ExamSnapshot {
    pub(crate) exams: Vec<Exam>,
}

pub(crate) struct ExamFeed {
    tx: watch::Sender<Arc<ExamSnapshot>>,
}

impl ExamFeed {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ExamSnapshot::default()));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<ExamSnapshot>> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> Arc<ExamSnapshot> {
        self.tx.borrow().clone()
    }

    pub(crate) fn publish(&self, exams: Vec<Exam>) -> bool {
        let snapshot = ExamSnapshot { exams };
        self.tx.send_if_modified(move |current| {
            if **current == snapshot {
                return false;
            }
            *current = Arc::new(snapshot);
            true
        })
    }

    pub(crate) async fn refresh(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let exams = repositories::exams::list_ending_after(pool, primitive_now_utc()).await?;
        let changed = self.publish(exams);
        if changed {
            metrics::counter!("exam_feed_snapshots_total").increment(1);
        }
        Ok(changed)
    }
}

pub(crate) async fn run_poller(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_secs(state.settings().exam().feed_poll_interval_seconds);
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = state.exam_feed().refresh(state.db()).await {
                    tracing::error!(error = %err, "Exam feed refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn exam(id: &str) -> Exam {
        let at = datetime!(2026-02-01 09:00:00);
        Exam {
            id: id.to_string(),
            name: format!("Exam {id}"),
            start_time: at,
            end_time: datetime!(2026-02-01 11:00:00),
            duration_minutes: 30,
            total_grade: 20.0,
            attempts_allowed: 1,
            created_by: "admin".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn identical_exam_set_does_not_notify() {
        let feed = ExamFeed::new();
        let mut rx = feed.subscribe();

        assert!(feed.publish(vec![exam("a")]));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        assert!(!feed.publish(vec![exam("a")]));
        assert!(!rx.has_changed().unwrap());

        assert!(feed.publish(vec![exam("a"), exam("b")]));
        assert_eq!(feed.current().exams.len(), 2);
    }
}
