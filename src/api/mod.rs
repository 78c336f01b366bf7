pub(crate) mod attendance;
pub(crate) mod class_records;
pub(crate) mod context;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod interventions;
pub(crate) mod placements;
pub(crate) mod programs;
pub(crate) mod router;
pub(crate) mod sections;
pub(crate) mod students;
pub(crate) mod validation;
