mod parsing;
mod settings;
mod types;

pub(crate) use parsing::is_valid_school_year;
pub(crate) use types::{ConfigError, Environment, Settings};
