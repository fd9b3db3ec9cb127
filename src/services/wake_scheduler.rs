use std::collections::{BTreeMap, HashMap};

use time::PrimitiveDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::db::models::Exam;

pub(crate) type WakePlan = BTreeMap<String, PrimitiveDateTime>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WakeEvent {
    pub(crate) exam_id: String,
    pub(crate) start_time: PrimitiveDateTime,
}

pub(crate) fn plan_wakeups<'a>(
    exams: impl IntoIterator<Item = &'a Exam>,
    now: PrimitiveDateTime,
) -> WakePlan {
    exams
        .into_iter()
        .filter(|exam| exam.start_time > now)
        .map(|exam| (exam.id.clone(), exam.start_time))
        .collect()
}

struct PendingWake {
    start_time: PrimitiveDateTime,
    handle: JoinHandle<()>,
}

pub(crate) struct WakeScheduler {
    pending: HashMap<String, PendingWake>,
    events: mpsc::UnboundedSender<WakeEvent>,
}

impl WakeScheduler {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<WakeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { pending: HashMap::new(), events }, rx)
    }

    /// `now` and `now_instant` are the same moment read from the wall clock and
    /// from the runtime clock; deadlines are derived from their offset.
    pub(crate) fn reconcile(
        &mut self,
        plan: &WakePlan,
        now: PrimitiveDateTime,
        now_instant: Instant,
    ) {
        self.pending.retain(|exam_id, pending| {
            let keep = plan.get(exam_id) == Some(&pending.start_time);
            if !keep {
                pending.handle.abort();
            }
            keep
        });

        for (exam_id, start_time) in plan {
            if self.pending.contains_key(exam_id) {
                continue;
            }

            let delay = *start_time - now;
            if delay <= time::Duration::ZERO {
                continue;
            }
            let Ok(delay) = std::time::Duration::try_from(delay) else {
                continue;
            };

            let handle = spawn_wake(
                self.events.clone(),
                WakeEvent { exam_id: exam_id.clone(), start_time: *start_time },
                now_instant + delay,
            );
            self.pending.insert(exam_id.clone(), PendingWake { start_time: *start_time, handle });
        }
    }

    pub(crate) fn consume(&mut self, event: &WakeEvent) -> bool {
        match self.pending.get(&event.exam_id) {
            Some(pending) if pending.start_time == event.start_time => {
                self.pending.remove(&event.exam_id);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, exam_id: &str) -> bool {
        self.pending.contains_key(exam_id)
    }
}

impl Drop for WakeScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn spawn_wake(
    events: mpsc::UnboundedSender<WakeEvent>,
    event: WakeEvent,
    deadline: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        metrics::counter!("exam_wakeups_fired_total").increment(1);
        tracing::debug!(exam_id = %event.exam_id, "Exam wake-up fired");
        // The listing may already be gone.
        let _ = events.send(event);
    })
}
