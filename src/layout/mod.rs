//! Layout of the cues that are visible at one point in time.
//!
//! The engine does not draw anything. It talks to a [`Renderer`], which builds a measurable box
//! for each cue and is told where to put it. All coordinates are in the renderer's units, with
//! the origin at the top left corner of the overlay the cues are shown in.

use crate::config::LayoutConfig;
use crate::cue::{Cue, DisplayState, PositionAlign, Region, Vertical};
use crate::markup::{self, Direction};

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};

mod geometry;
mod line;
mod region;

pub use geometry::{Axis, LayoutBox};
pub use line::{compute_line_pos, move_box_to_line_position};
pub use region::{RegionKey, RegionLayout, RegionManager};

/// Opaque reference to a box owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(pub u64);

/// The container a cue box is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    /// The padded overlay that holds all cues outside of regions.
    Overlay,

    /// The inner container of a region.
    Region(RegionKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritingMode {
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HorizontalTb => "horizontal-tb",
            Self::VerticalRl => "vertical-rl",
            Self::VerticalLr => "vertical-lr",
        }
    }
}

impl From<Vertical> for WritingMode {
    fn from(vertical: Vertical) -> Self {
        match vertical {
            Vertical::Horizontal => Self::HorizontalTb,
            Vertical::RightToLeft => Self::VerticalRl,
            Vertical::LeftToRight => Self::VerticalLr,
        }
    }
}

/// Everything a renderer needs to build the box for one cue.
#[derive(Debug)]
pub struct CueBoxRequest<'a> {
    pub cue: &'a Cue,
    pub markup: &'a markup::Node,

    /// Suggested font size, in the renderer's units.
    pub font_size: f64,
    pub writing_mode: WritingMode,
    pub text_align: &'static str,
    pub direction: Direction,

    /// Offset of the box along the inline axis, as a percentage of the container.
    pub inline_offset: f64,

    /// Size of the box along the inline axis, as a percentage of the container.
    pub inline_size: f64,

    /// The container the box will be placed in.
    pub container: LayoutBox,
}

/// What the renderer measured after building a cue box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    /// Extent of the box along the block axis: its height for horizontal cues, its width for
    /// vertical ones.
    pub block_size: f64,
    pub line_height: f64,
}

/// The rendering backend the layout engine drives.
pub trait Renderer {
    /// Build a detached box for a cue and measure it.
    fn build_cue_box(&mut self, request: &CueBoxRequest<'_>) -> (RenderHandle, BoxMetrics);

    /// Attach a box to `parent`, or move it there. `rect` is relative to the top left corner of
    /// the parent container.
    fn attach(&mut self, handle: RenderHandle, parent: Parent, rect: LayoutBox);

    /// Remove a box from wherever it is attached and release it.
    fn detach(&mut self, handle: RenderHandle);

    /// The container a box is currently attached to.
    fn parent_of(&self, handle: RenderHandle) -> Option<Parent>;

    /// Width and height of the overlay.
    fn overlay_size(&self) -> (f64, f64);

    /// Apply the geometry of a region's containers.
    fn update_region(&mut self, _layout: &RegionLayout) {}
}

/// Where one cue ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index of the cue in the slice passed to [`LayoutEngine::process_cues`].
    pub cue: usize,
    pub handle: RenderHandle,
    pub parent: Parent,

    /// Relative to the parent container.
    pub rect: LayoutBox,

    /// Whether the box was built in this pass, as opposed to kept from an earlier one.
    pub computed: bool,
}

/// The outcome of one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPass {
    /// `false` if nothing needed to be laid out and all existing boxes were kept.
    pub recomputed: bool,
    pub font_size: f64,

    /// The padded overlay container, relative to the overlay.
    pub container: LayoutBox,
    pub placements: Vec<Placement>,
    pub regions: Vec<RegionLayout>,
}

/// Lays out cues against a [`Renderer`], keeping track of the boxes it has attached between
/// passes.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    regions: RegionManager,
    attached: IndexMap<RenderHandle, Parent>,
}

impl LayoutEngine {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            regions: RegionManager::new(),
            attached: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn regions(&self) -> &RegionManager {
        &self.regions
    }

    /// Lay out `cues`, the cues that should currently be visible, in order.
    ///
    /// Boxes from earlier passes whose cue is not in `cues` any more are detached. Cues that are
    /// already placed keep their box; the others are built and positioned so that they do not
    /// overlap boxes placed before them. `regions` lists the regions known to the track, so their
    /// containers exist even while empty.
    pub fn process_cues<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        cues: &mut [Cue],
        regions: &[Rc<Region>],
    ) -> LayoutPass {
        let overlay_size = renderer.overlay_size();

        self.remove_retired(renderer, cues);

        let cue_regions = cues.iter().filter_map(Cue::region).collect::<Vec<_>>();
        self.regions
            .setup_regions(regions.iter().chain(&cue_regions), overlay_size, &self.config);

        let container = padded_container(overlay_size, self.config.overlay_padding_percent);

        let should_compute = cues
            .iter()
            .any(|cue| cue.has_been_reset || cue.display_state.is_none());
        if !should_compute {
            debug!("all {} cues already laid out, keeping their boxes", cues.len());
            return self.readd_existing(renderer, cues, container);
        }

        let font_size = self.font_size(overlay_size.1);

        let skipped = cues
            .iter()
            .map(|cue| self.is_placed(&*renderer, cue))
            .collect::<Vec<_>>();

        // Boxes kept from earlier passes still take up space
        let mut placed = cues
            .iter()
            .zip(&skipped)
            .filter(|(_, skipped)| **skipped)
            .filter_map(|(cue, _)| cue.display_state)
            .filter(|state| state.parent == Parent::Overlay)
            .map(|state| state.rect.absolute_from(&container))
            .collect::<Vec<_>>();

        let mut placements = Vec::with_capacity(cues.len());

        for (index, (cue, skipped)) in cues.iter_mut().zip(skipped).enumerate() {
            if skipped && let Some(state) = cue.display_state {
                placements.push(Placement {
                    cue: index,
                    handle: state.handle,
                    parent: state.parent,
                    rect: state.rect,
                    computed: false,
                });
                continue;
            }

            if let Some(state) = cue.display_state.take() {
                self.release(renderer, state.handle);
            }

            let region_key = cue.region().and_then(|region| self.regions.key_for(&region));
            let cue_container = region_key
                .and_then(|key| self.regions.inner_box(key))
                .unwrap_or(container);

            let (inline_offset, inline_size) = inline_extent(cue);
            let markup = cue.markup();
            let request = CueBoxRequest {
                cue,
                markup,
                font_size,
                writing_mode: cue.vertical.into(),
                text_align: cue.align.text_align(),
                direction: markup::direction(markup),
                inline_offset,
                inline_size,
                container: cue_container,
            };
            let (handle, metrics) = renderer.build_cue_box(&request);
            let initial = initial_box(cue, &cue_container, inline_offset, inline_size, metrics);

            let region_rect = region_key.and_then(|key| {
                let rect = self
                    .regions
                    .handle_region_cue(key, handle, initial.relative_to(&cue_container))?;
                Some((Parent::Region(key), rect))
            });

            let (parent, rect) = match region_rect {
                Some(region_rect) => region_rect,
                None => {
                    let cue_box = move_box_to_line_position(initial, &container, &placed, cue);
                    placed.push(cue_box);
                    (Parent::Overlay, cue_box.relative_to(&container))
                }
            };

            trace!(
                "cue {index} ({:?}) placed in {parent:?} at ({}, {}) size {}x{}",
                cue.id, rect.left, rect.top, rect.width, rect.height
            );

            renderer.attach(handle, parent, rect);
            self.attached.insert(handle, parent);
            cue.display_state = Some(DisplayState {
                handle,
                rect,
                parent,
            });
            cue.has_been_reset = false;

            placements.push(Placement {
                cue: index,
                handle,
                parent,
                rect,
                computed: true,
            });
        }

        self.restack_region_cues(renderer, cues, &mut placements);
        let regions = self.update_regions(renderer);

        LayoutPass {
            recomputed: true,
            font_size,
            container,
            placements,
            regions,
        }
    }

    /// Detach every box this engine attached, for example when the track is hidden.
    pub fn clear<R: Renderer + ?Sized>(&mut self, renderer: &mut R, cues: &mut [Cue]) {
        for cue in cues {
            cue.display_state = None;
        }
        self.remove_retired(renderer, &[]);
    }

    fn remove_retired<R: Renderer + ?Sized>(&mut self, renderer: &mut R, cues: &[Cue]) {
        let retired = self
            .attached
            .keys()
            .copied()
            .filter(|handle| {
                !cues
                    .iter()
                    .any(|cue| cue.display_state.is_some_and(|state| state.handle == *handle))
            })
            .collect::<Vec<_>>();

        for handle in retired {
            trace!("removing retired cue box {handle:?}");
            self.release(renderer, handle);
        }
    }

    fn release<R: Renderer + ?Sized>(&mut self, renderer: &mut R, handle: RenderHandle) {
        if let Some(Parent::Region(_)) = self.attached.shift_remove(&handle) {
            self.regions.remove_region_cue(handle);
        }
        renderer.detach(handle);
    }

    /// Whether the cue's box from an earlier pass can stay where it is.
    fn is_placed<R: Renderer + ?Sized>(&self, renderer: &R, cue: &Cue) -> bool {
        let Some(state) = cue.display_state else {
            return false;
        };
        if cue.has_been_reset {
            return false;
        }

        match (state.parent, renderer.parent_of(state.handle)) {
            (Parent::Overlay, Some(Parent::Overlay)) => cue.region().is_none(),
            (Parent::Region(key), Some(Parent::Region(attached_key))) => {
                key == attached_key
                    && cue
                        .region()
                        .and_then(|region| self.regions.key_for(&region))
                        == Some(key)
                    && self.regions.cue_in_region(key, state.handle)
            }
            _ => false,
        }
    }

    fn readd_existing<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        cues: &mut [Cue],
        container: LayoutBox,
    ) -> LayoutPass {
        let mut placements = Vec::with_capacity(cues.len());

        for (index, cue) in cues.iter().enumerate() {
            let Some(state) = cue.display_state else {
                continue;
            };

            if let Parent::Region(key) = state.parent {
                self.regions.readd_region_cue(key, state.handle, state.rect);
            }
            if renderer.parent_of(state.handle) != Some(state.parent) {
                renderer.attach(state.handle, state.parent, state.rect);
            }
            self.attached.insert(state.handle, state.parent);

            placements.push(Placement {
                cue: index,
                handle: state.handle,
                parent: state.parent,
                rect: state.rect,
                computed: false,
            });
        }

        self.restack_region_cues(renderer, cues, &mut placements);
        let regions = self.update_regions(renderer);

        LayoutPass {
            recomputed: false,
            font_size: self.font_size(renderer.overlay_size().1),
            container,
            placements,
            regions,
        }
    }

    /// Move region cue boxes whose stacking position changed, because a sibling above them
    /// retired, to where their region puts them now.
    fn restack_region_cues<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        cues: &mut [Cue],
        placements: &mut [Placement],
    ) {
        for placement in placements {
            let Parent::Region(key) = placement.parent else {
                continue;
            };
            let Some(rect) = self.regions.cue_rect(key, placement.handle) else {
                continue;
            };
            if rect == placement.rect {
                continue;
            }

            trace!("moving region cue box {:?} to top {}", placement.handle, rect.top);
            renderer.attach(placement.handle, placement.parent, rect);
            placement.rect = rect;
            if let Some(state) = cues
                .get_mut(placement.cue)
                .and_then(|cue| cue.display_state.as_mut())
            {
                state.rect = rect;
            }
        }
    }

    /// Font size hint for an overlay of the given height, rounded to two decimals.
    fn font_size(&self, overlay_height: f64) -> f64 {
        (overlay_height * self.config.font_size_percent * 100.0).round() / 100.0
    }

    fn update_regions<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Vec<RegionLayout> {
        let layouts = self.regions.layouts(&self.config);
        for layout in &layouts {
            renderer.update_region(layout);
        }
        layouts
    }
}

/// The overlay minus its padding on all sides.
fn padded_container((width, height): (f64, f64), padding_percent: f64) -> LayoutBox {
    let padding = width * padding_percent / 100.0;
    LayoutBox::new(
        padding,
        padding,
        (width - 2.0 * padding).max(0.0),
        (height - 2.0 * padding).max(0.0),
        0.0,
    )
}

/// Offset and size of the cue box along the inline axis, in percent.
fn inline_extent(cue: &Cue) -> (f64, f64) {
    let position = cue.computed_position();
    let offset = match cue.position_align {
        PositionAlign::Start => position,
        PositionAlign::Center => position - cue.size / 2.0,
        PositionAlign::End => position - cue.size,
    };
    (offset, cue.size)
}

/// The cue box before line positioning: placed along the inline axis, and at the edge of the
/// container that line 0 refers to.
fn initial_box(
    cue: &Cue,
    container: &LayoutBox,
    inline_offset: f64,
    inline_size: f64,
    metrics: BoxMetrics,
) -> LayoutBox {
    match cue.vertical {
        Vertical::Horizontal => LayoutBox::new(
            container.left + container.width * inline_offset / 100.0,
            container.top,
            container.width * inline_size / 100.0,
            metrics.block_size,
            metrics.line_height,
        ),
        Vertical::RightToLeft | Vertical::LeftToRight => {
            let left = if cue.vertical == Vertical::RightToLeft {
                container.right - metrics.block_size
            } else {
                container.left
            };
            LayoutBox::new(
                left,
                container.top + container.height * inline_offset / 100.0,
                metrics.block_size,
                container.height * inline_size / 100.0,
                metrics.line_height,
            )
        }
    }
}
