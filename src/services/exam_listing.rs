use std::sync::Arc;

use serde::Serialize;
use time::{Duration, PrimitiveDateTime};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::Exam;
use crate::services::exam_feed::ExamSnapshot;
use crate::services::session_gate::{self, GateDecision};
use crate::services::wake_scheduler::{plan_wakeups, WakeEvent, WakeScheduler};

pub(crate) trait Clock: Send {
    fn now(&self) -> PrimitiveDateTime;
    fn instant(&self) -> Instant;
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        primitive_now_utc()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListedExam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) gate: GateDecision,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExamListing {
    pub(crate) generated_at: String,
    pub(crate) exams: Vec<ListedExam>,
}

pub(crate) fn visible_exams(
    exams: &[Exam],
    now: PrimitiveDateTime,
    lookback: Duration,
) -> Vec<&Exam> {
    let earliest_start = now - lookback;
    exams.iter().filter(|exam| exam.end_time > now && exam.start_time >= earliest_start).collect()
}

pub(crate) fn render_listing(
    exams: &[Exam],
    now: PrimitiveDateTime,
    lookback: Duration,
) -> ExamListing {
    build_listing(visible_exams(exams, now, lookback), now)
}

fn build_listing(visible: Vec<&Exam>, now: PrimitiveDateTime) -> ExamListing {
    ExamListing {
        generated_at: format_primitive(now),
        exams: visible
            .into_iter()
            .map(|exam| ListedExam {
                id: exam.id.clone(),
                name: exam.name.clone(),
                start_time: format_primitive(exam.start_time),
                end_time: format_primitive(exam.end_time),
                duration_minutes: exam.duration_minutes,
                total_grade: exam.total_grade,
                attempts_allowed: exam.attempts_allowed,
                gate: session_gate::evaluate(exam, now),
            })
            .collect(),
    }
}

pub(crate) struct ExamListView<C: Clock = SystemClock> {
    feed: watch::Receiver<Arc<ExamSnapshot>>,
    scheduler: WakeScheduler,
    wakeups: mpsc::UnboundedReceiver<WakeEvent>,
    clock: C,
    lookback: Duration,
}

impl<C: Clock> ExamListView<C> {
    pub(crate) fn new(
        feed: watch::Receiver<Arc<ExamSnapshot>>,
        clock: C,
        lookback: Duration,
    ) -> Self {
        let (scheduler, wakeups) = WakeScheduler::new();
        Self { feed, scheduler, wakeups, clock, lookback }
    }

    pub(crate) fn render(&mut self) -> ExamListing {
        let snapshot = self.feed.borrow_and_update().clone();
        let now = self.clock.now();
        let visible = visible_exams(&snapshot.exams, now, self.lookback);

        let plan = plan_wakeups(visible.iter().copied(), now);
        self.scheduler.reconcile(&plan, now, self.clock.instant());

        build_listing(visible, now)
    }

    pub(crate) async fn next(&mut self) -> Option<ExamListing> {
        tokio::select! {
            changed = self.feed.changed() => {
                if changed.is_err() {
                    return None;
                }
            }
            Some(event) = self.wakeups.recv() => {
                self.scheduler.consume(&event);
            }
        }
        Some(self.render())
    }

    #[cfg(test)]
    pub(crate) fn pending_wakeups(&self) -> usize {
        self.scheduler.pending()
    }
}
