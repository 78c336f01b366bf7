pub(crate) mod attendance;
pub(crate) mod class_records;
pub(crate) mod family;
pub(crate) mod grades;
pub(crate) mod health;
pub(crate) mod interventions;
pub(crate) mod placements;
pub(crate) mod programs;
pub(crate) mod sections;
pub(crate) mod students;
pub(crate) mod subject_assignments;
