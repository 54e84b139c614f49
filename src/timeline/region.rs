use std::{collections::BTreeMap, str::FromStr};

use crate::{
    foundation::core::{Rect, Viewport},
    foundation::error::{ReelError, ReelResult},
};

/// A position along an extent (element box or viewport), measured from its top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edge {
    /// Top edge.
    Top,
    /// Vertical center.
    Center,
    /// Bottom edge.
    Bottom,
    /// Percentage of the extent's height.
    Percent(f64),
    /// Absolute pixels from the top.
    Px(f64),
}

impl Edge {
    fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => extent / 2.0,
            Self::Bottom => extent,
            Self::Percent(p) => extent * p / 100.0,
            Self::Px(px) => px,
        }
    }

    fn parse(token: &str) -> ReelResult<Self> {
        match token {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => {
                if let Some(n) = token.strip_suffix('%') {
                    return parse_number(n, token).map(Self::Percent);
                }
                let n = token.strip_suffix("px").unwrap_or(token);
                parse_number(n, token).map(Self::Px)
            }
        }
    }
}

/// Scroll distance relative to the region start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Pixels.
    Px(f64),
    /// Percentage of the viewport height.
    ViewportPercent(f64),
}

impl Length {
    fn resolve(self, viewport_height: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::ViewportPercent(p) => viewport_height * p / 100.0,
        }
    }
}

/// When a region starts or ends, in `"<element edge> <viewport edge>"` form.
///
/// `"top 72%"` is reached when the trigger's top meets 72% of the viewport height;
/// `"+=150%"` (end only) is 1.5 viewport heights after the start.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Criterion {
    /// Element edge meets viewport edge.
    Anchor {
        /// Edge on the trigger element.
        element: Edge,
        /// Edge on the viewport.
        viewport: Edge,
    },
    /// Fixed distance after the start criterion.
    AfterStart(Length),
}

impl Criterion {
    /// `"top bottom"`: the trigger's top enters the viewport.
    pub const TOP_BOTTOM: Self = Self::Anchor {
        element: Edge::Top,
        viewport: Edge::Bottom,
    };
    /// `"bottom top"`: the trigger's bottom leaves the viewport.
    pub const BOTTOM_TOP: Self = Self::Anchor {
        element: Edge::Bottom,
        viewport: Edge::Top,
    };

    fn anchor_offset(element: Edge, viewport: Edge, trigger: Rect, vp: &Viewport) -> f64 {
        trigger.y0 + element.resolve(trigger.height()) - viewport.resolve(vp.height)
    }
}

impl FromStr for Criterion {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("+=") {
            let rest = rest.trim();
            let len = if let Some(n) = rest.strip_suffix('%') {
                Length::ViewportPercent(parse_number(n, s)?)
            } else {
                Length::Px(parse_number(rest.strip_suffix("px").unwrap_or(rest), s)?)
            };
            return Ok(Self::AfterStart(len));
        }

        let mut tokens = s.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(e), Some(v), None) => Ok(Self::Anchor {
                element: Edge::parse(e)?,
                viewport: Edge::parse(v)?,
            }),
            _ => Err(ReelError::validation(format!(
                "criterion '{s}' must be '<element edge> <viewport edge>' or '+=<length>'"
            ))),
        }
    }
}

impl TryFrom<String> for Criterion {
    type Error = ReelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Criterion> for String {
    fn from(c: Criterion) -> Self {
        fn edge(e: Edge) -> String {
            match e {
                Edge::Top => "top".to_owned(),
                Edge::Center => "center".to_owned(),
                Edge::Bottom => "bottom".to_owned(),
                Edge::Percent(p) => format!("{p}%"),
                Edge::Px(px) => format!("{px}px"),
            }
        }
        match c {
            Criterion::Anchor { element, viewport } => format!("{} {}", edge(element), edge(viewport)),
            Criterion::AfterStart(Length::Px(px)) => format!("+={px}px"),
            Criterion::AfterStart(Length::ViewportPercent(p)) => format!("+={p}%"),
        }
    }
}

fn parse_number(n: &str, whole: &str) -> ReelResult<f64> {
    let v = n
        .trim()
        .parse::<f64>()
        .map_err(|_| ReelError::validation(format!("invalid number in criterion '{whole}'")))?;
    if !v.is_finite() {
        return Err(ReelError::validation(format!(
            "criterion '{whole}' must be finite"
        )));
    }
    Ok(v)
}

fn default_start() -> Criterion {
    Criterion::TOP_BOTTOM
}

fn default_end() -> Criterion {
    Criterion::BOTTOM_TOP
}

/// A scroll range bound to a trigger element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollRegion {
    /// Name of the trigger element, resolved through a [`LayoutProvider`].
    pub trigger: String,
    /// Start criterion.
    #[serde(default = "default_start")]
    pub start: Criterion,
    /// End criterion.
    #[serde(default = "default_end")]
    pub end: Criterion,
    /// Seconds the progress lags behind the scroll position; `0` follows instantly.
    #[serde(default)]
    pub scrub: f64,
    /// Layout-lock the trigger while inside the region.
    #[serde(default)]
    pub pin: bool,
}

impl ScrollRegion {
    /// Region over `trigger` with default criteria (`top bottom` → `bottom top`).
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            start: default_start(),
            end: default_end(),
            scrub: 0.0,
            pin: false,
        }
    }

    /// Builder: set start and end criteria.
    pub fn between(mut self, start: Criterion, end: Criterion) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Builder: set the scrub lag.
    pub fn scrub(mut self, secs: f64) -> Self {
        self.scrub = secs;
        self
    }

    /// Builder: enable pinning.
    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }

    /// Static checks that do not need layout.
    pub fn validate(&self) -> ReelResult<()> {
        if self.trigger.trim().is_empty() {
            return Err(ReelError::validation("region trigger must be non-empty"));
        }
        if !self.scrub.is_finite() || self.scrub < 0.0 {
            return Err(ReelError::validation(format!(
                "region '{}' scrub must be finite and >= 0, got {}",
                self.trigger, self.scrub
            )));
        }
        if matches!(self.start, Criterion::AfterStart(_)) {
            return Err(ReelError::validation(format!(
                "region '{}' start criterion cannot be relative",
                self.trigger
            )));
        }
        Ok(())
    }

    /// Scroll offsets `(start, end)` for a trigger box in document coordinates.
    pub fn offsets(&self, trigger: Rect, vp: &Viewport) -> (f64, f64) {
        let start = match self.start {
            Criterion::Anchor { element, viewport } => {
                Criterion::anchor_offset(element, viewport, trigger, vp)
            }
            Criterion::AfterStart(len) => len.resolve(vp.height),
        };
        let end = match self.end {
            Criterion::Anchor { element, viewport } => {
                Criterion::anchor_offset(element, viewport, trigger, vp)
            }
            Criterion::AfterStart(len) => start + len.resolve(vp.height),
        };
        (start, end)
    }
}

/// Source of viewport size and element boxes.
pub trait LayoutProvider {
    /// Current viewport.
    fn viewport(&self) -> Viewport;
    /// Box of the named element in document coordinates, if it exists.
    fn bounds(&self, trigger: &str) -> Option<Rect>;
}

/// Fixed layout snapshot, typically built from scene configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticLayout {
    viewport: Viewport,
    elements: BTreeMap<String, Rect>,
}

impl StaticLayout {
    /// Layout with no elements.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            elements: BTreeMap::new(),
        }
    }

    /// Builder: add an element spanning the viewport width from `top` to `top + height`.
    pub fn with_element(mut self, name: impl Into<String>, top: f64, height: f64) -> Self {
        self.set_element(name, top, height);
        self
    }

    /// Insert or move an element.
    pub fn set_element(&mut self, name: impl Into<String>, top: f64, height: f64) {
        let rect = Rect::new(0.0, top, self.viewport.width, top + height.max(0.0));
        self.elements.insert(name.into(), rect);
    }

    /// Remove an element. Returns `true` if it existed.
    pub fn remove_element(&mut self, name: &str) -> bool {
        self.elements.remove(name).is_some()
    }

    /// Replace the viewport (a resize).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Bottom of the lowest element: the document height.
    pub fn document_height(&self) -> f64 {
        self.elements
            .values()
            .map(|r| r.y1)
            .fold(self.viewport.height, f64::max)
    }
}

impl LayoutProvider for StaticLayout {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn bounds(&self, trigger: &str) -> Option<Rect> {
        self.elements.get(trigger).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/region.rs"]
mod tests;
