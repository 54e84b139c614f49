//! scrollreel is a headless engine for scroll-driven page experiences.
//!
//! It synchronizes a damped smooth-scroll source with scroll-bound animation timelines and
//! scrubs a pre-decoded frame sequence onto a canvas from scroll progress:
//!
//! - Describe a page with a [`SceneConfig`] (layout, scroll tuning, intro, sequence, regions)
//! - Create an [`ExperienceSession`] over a [`RenderSurface`] such as [`PixmapSurface`]
//! - Load frames through an [`AssetLoader`], feed input, and call
//!   [`ExperienceSession::tick`] once per display refresh
//!
//! The lower layers are usable on their own: [`SmoothScroll`] produces offsets,
//! [`TimelineDriver`] turns offsets into per-region [`Progress`], and
//! [`FrameSequencePlayer`] draws the frame selected by [`frame_index`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod intro;
pub(crate) mod player;
pub(crate) mod scroll;
pub(crate) mod session;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    Direction, Point, Progress, Rect, Rgba8, Size, Vec2, Viewport,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::anim::{Lerp, PropertySet, Tween, TweenDriver, TweenSample};
pub use crate::animation::ease::Ease;
pub use crate::animation::keyframes::{KeyframeTimeline, TimelineEntry};
pub use crate::animation::mapper::{
    MAX_VELOCITY_SKEW_DEG, TiltBinding, frame_index, tilt, tween_props, velocity_skew,
};
pub use crate::intro::gate::{IntroConfig, IntroEvent, IntroGate, IntroState};
pub use crate::intro::scratch::ScratchMask;
pub use crate::player::frame_set::FrameSet;
pub use crate::player::letterbox::{fit_rect, has_bars};
pub use crate::player::loader::{
    AssetLoader, DecodedImage, FsImageLoader, LoadFailure, LoadReport, decode_image, load_all,
    numbered_locators,
};
pub use crate::player::sequence::{
    DEFAULT_BACKGROUND, FALLBACK_FILL, FrameSequencePlayer, PlayerState, RenderStats,
};
pub use crate::player::surface::{PixmapSurface, RenderSurface};
pub use crate::scroll::source::{
    InputKind, ScrollCallback, ScrollSource, ScrollToOpts, SmoothScroll, SmoothScrollOpts,
    Subscription,
};
pub use crate::session::config::{ElementDef, SceneConfig, SequenceDef, TweenDef, TweenRegionDef};
pub use crate::session::experience::{ExperienceSession, RegionReport, TickReport};
pub use crate::session::readiness::{Readiness, ReadinessSet};
pub use crate::timeline::driver::{
    DriverStats, PinState, ProgressCallback, RegionHandle, RegionUpdate, ScrollFrame,
    TickControl, TimelineDriver,
};
pub use crate::timeline::region::{
    Criterion, Edge, LayoutProvider, Length, ScrollRegion, StaticLayout,
};
