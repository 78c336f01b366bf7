pub(crate) mod attendance;
pub(crate) mod grading;
pub(crate) mod interventions;
pub(crate) mod section_assignment;
