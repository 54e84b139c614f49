pub(crate) mod config;
pub(crate) mod experience;
pub(crate) mod readiness;
