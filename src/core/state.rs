use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::exam_feed::ExamFeed;
use crate::services::storage::StorageService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    exam_feed: ExamFeed,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> Self {
        let exam_feed = ExamFeed::new();
        Self { inner: Arc::new(InnerState { settings, db, redis, storage, exam_feed }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn exam_feed(&self) -> &ExamFeed {
        &self.inner.exam_feed
    }

    pub(crate) async fn refresh_exam_feed(&self) {
        if let Err(err) = self.exam_feed().refresh(self.db()).await {
            tracing::warn!(error = %err, "Failed to refresh exam feed after write");
        }
    }
}
