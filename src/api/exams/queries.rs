use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ManageExamsQuery {
    #[serde(default)]
    pub(super) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(super) limit: i64,
}
