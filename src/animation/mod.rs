pub(crate) mod anim;
pub(crate) mod ease;
pub(crate) mod keyframes;
pub(crate) mod mapper;
