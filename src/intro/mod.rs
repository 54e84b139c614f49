pub(crate) mod gate;
pub(crate) mod scratch;
