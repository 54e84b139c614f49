use std::{collections::BTreeSet, fs::File, io::BufReader, path::Path};

use crate::{
    animation::anim::{PropertySet, Tween},
    animation::ease::Ease,
    animation::keyframes::KeyframeTimeline,
    foundation::core::{Rgba8, Viewport},
    foundation::error::{ReelError, ReelResult},
    intro::gate::IntroConfig,
    player::loader::numbered_locators,
    player::sequence::DEFAULT_BACKGROUND,
    scroll::source::SmoothScrollOpts,
    timeline::region::{Criterion, Edge, ScrollRegion, StaticLayout},
};

/// A named block of the page in document coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDef {
    /// Name used as a region trigger.
    pub name: String,
    /// Top edge in CSS pixels.
    pub top: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

/// Scroll-scrubbed frame sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDef {
    /// Numbered locator pattern, e.g. `images/{n:04}.jpg`.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Number of the first frame.
    #[serde(default = "default_first")]
    pub first: u32,
    /// Frames requested.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Region scrubbing the sequence.
    #[serde(default = "default_sequence_region")]
    pub region: ScrollRegion,
    /// Letterbox fill.
    #[serde(default = "default_background")]
    pub background: Rgba8,
    /// Loader worker threads; `None` uses rayon defaults.
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_pattern() -> String {
    "images/{n:04}.jpg".to_owned()
}

fn default_first() -> u32 {
    1
}

fn default_count() -> u32 {
    100
}

fn default_sequence_region() -> ScrollRegion {
    let start = Criterion::Anchor {
        element: Edge::Top,
        viewport: Edge::Top,
    };
    let end = Criterion::Anchor {
        element: Edge::Bottom,
        viewport: Edge::Bottom,
    };
    ScrollRegion::new("section3")
        .between(start, end)
        .scrub(1.2)
        .pinned()
}

fn default_background() -> Rgba8 {
    DEFAULT_BACKGROUND
}

impl SequenceDef {
    /// Expanded frame locators.
    pub fn locators(&self) -> ReelResult<Vec<String>> {
        numbered_locators(&self.pattern, self.first, self.count)
    }
}

/// One tween placed on a region's timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweenDef {
    /// Animated element.
    pub target: String,
    /// Start values.
    #[serde(default)]
    pub from: PropertySet,
    /// End values.
    pub to: PropertySet,
    /// Easing name (`none`, `power3.out`, `back.out(1.7)`, ...).
    #[serde(default = "default_ease")]
    pub ease: String,
    /// Absolute position; when absent the tween follows the previous one after `gap`.
    #[serde(default)]
    pub at: Option<f64>,
    /// Offset from the end of the timeline when `at` is absent; negative overlaps.
    #[serde(default)]
    pub gap: f64,
    /// Length in timeline units.
    #[serde(default = "default_tween_duration")]
    pub duration: f64,
}

fn default_ease() -> String {
    "none".to_owned()
}

fn default_tween_duration() -> f64 {
    1.0
}

/// A region scrubbing a keyframe timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweenRegionDef {
    /// Scroll region.
    pub region: ScrollRegion,
    /// Tweens in composition order.
    pub tweens: Vec<TweenDef>,
}

impl TweenRegionDef {
    /// Build the keyframe timeline, parsing easing names.
    pub fn build_timeline(&self) -> ReelResult<KeyframeTimeline> {
        let mut timeline = KeyframeTimeline::new();
        for def in &self.tweens {
            let ease: Ease = def.ease.parse()?;
            let tween = Tween::scrubbed(def.target.clone(), def.from.clone(), def.to.clone(), ease);
            match def.at {
                Some(at) => timeline.insert(at, def.duration, tween)?,
                None => timeline.append(def.gap, def.duration, tween)?,
            }
        }
        Ok(timeline)
    }
}

/// JSON description of a page: layout, scroll tuning, intro, frame sequence and tween regions.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Initial viewport.
    pub viewport: Viewport,
    /// Page blocks in document order.
    #[serde(default)]
    pub elements: Vec<ElementDef>,
    /// Smooth-scroll tuning.
    #[serde(default)]
    pub scroll: SmoothScrollOpts,
    /// Intro tuning.
    #[serde(default)]
    pub intro: IntroConfig,
    /// Frame sequence, if the page has one.
    #[serde(default)]
    pub sequence: Option<SequenceDef>,
    /// Scroll-scrubbed timelines bound once the intro unlocks scrolling.
    #[serde(default)]
    pub regions: Vec<TweenRegionDef>,
}

impl SceneConfig {
    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ReelError::validation(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::serde(e.to_string()))
    }

    /// Check every section; layout references are resolved later at bind time.
    pub fn validate(&self) -> ReelResult<()> {
        self.viewport.validate()?;
        self.scroll.validate()?;
        self.intro.validate()?;

        let mut names = BTreeSet::new();
        for el in &self.elements {
            if el.name.trim().is_empty() {
                return Err(ReelError::validation("element name must be non-empty"));
            }
            if !names.insert(el.name.as_str()) {
                return Err(ReelError::validation(format!(
                    "duplicate element '{}'",
                    el.name
                )));
            }
            if !el.top.is_finite() || !el.height.is_finite() || el.height < 0.0 {
                return Err(ReelError::validation(format!(
                    "element '{}' needs finite top and height >= 0",
                    el.name
                )));
            }
        }

        if let Some(seq) = &self.sequence {
            if seq.count == 0 {
                return Err(ReelError::validation("sequence count must be > 0"));
            }
            if seq.threads == Some(0) {
                return Err(ReelError::validation("sequence threads must be >= 1 when set"));
            }
            seq.locators()?;
            seq.region.validate()?;
        }

        for (i, def) in self.regions.iter().enumerate() {
            def.region.validate()?;
            if def.tweens.is_empty() {
                return Err(ReelError::validation(format!(
                    "region {i} ('{}') has no tweens",
                    def.region.trigger
                )));
            }
            def.build_timeline()?;
        }
        Ok(())
    }

    /// Layout snapshot of the configured elements.
    pub fn layout(&self) -> StaticLayout {
        self.elements
            .iter()
            .fold(StaticLayout::new(self.viewport), |layout, el| {
                layout.with_element(el.name.clone(), el.top, el.height)
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
