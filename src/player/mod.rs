pub(crate) mod frame_set;
pub(crate) mod letterbox;
pub(crate) mod loader;
pub(crate) mod sequence;
pub(crate) mod surface;
