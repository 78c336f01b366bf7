use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod attendance;
pub(crate) mod enrollment;
pub(crate) mod family;
pub(crate) mod grading;
pub(crate) mod intervention;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}
