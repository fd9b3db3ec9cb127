pub(crate) mod exam_feed;
pub(crate) mod exam_listing;
pub(crate) mod grade_band;
pub(crate) mod question_authoring;
pub(crate) mod session_finalize;
pub(crate) mod session_gate;
pub(crate) mod session_timing;
pub(crate) mod storage;
pub(crate) mod wake_scheduler;
