//! Bookkeeping for region containers: an outer box of fixed size anchored in the overlay, and an
//! inner box anchored to the outer box's bottom edge that grows as cues are added to it.

use crate::config::LayoutConfig;
use crate::cue::{Region, Scroll};
use super::{LayoutBox, RenderHandle};

use std::rc::Rc;

use log::debug;

/// Identifies a region registered with a [`RegionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey(usize);

/// Geometry of one region after a layout pass, for the renderer to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLayout {
    pub key: RegionKey,
    pub id: String,

    /// The fixed outer container, relative to the overlay.
    pub outer: LayoutBox,

    /// The inner container cues are stacked in, relative to the overlay.
    pub inner: LayoutBox,

    pub previous_inner_height: f64,

    /// Tracked inner height, or `None` if the inner container should size to its content.
    pub inner_height: Option<f64>,

    /// Whether the renderer should transition from the previous height to the new one.
    pub animate: bool,
    pub transition_seconds: f64,
}

struct RegionEntry {
    region: Rc<Region>,
    outer: LayoutBox,
    inner_height: Option<f64>,

    /// Cue boxes in the inner container, with their rectangles relative to it.
    children: Vec<(RenderHandle, LayoutBox)>,
    reported_height: f64,
}

impl RegionEntry {
    fn content_height(&self) -> f64 {
        self.children.iter().map(|(_, rect)| rect.height).sum()
    }

    /// Stack the cue boxes top to bottom in the order they were added, with no gaps.
    fn restack(&mut self) {
        let mut top = 0.0;
        for (_, rect) in &mut self.children {
            *rect = rect.with_top(top);
            top += rect.height;
        }
    }

    fn inner_box(&self) -> LayoutBox {
        let height = self.inner_height.unwrap_or_else(|| self.content_height());
        LayoutBox::new(
            self.outer.left,
            self.outer.bottom - height,
            self.outer.width,
            height,
            0.0,
        )
    }
}

#[derive(Default)]
pub struct RegionManager {
    entries: Vec<RegionEntry>,
    overlay_height: Option<f64>,
}

impl RegionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every region that is not known yet. If the overlay height changed since the last
    /// call, known regions have their vertical position refreshed.
    pub fn setup_regions<'a, I>(
        &mut self,
        regions: I,
        overlay_size: (f64, f64),
        config: &LayoutConfig,
    ) where
        I: IntoIterator<Item = &'a Rc<Region>>,
    {
        let height_changed = self
            .overlay_height
            .is_some_and(|height| (height - overlay_size.1).abs() > f64::EPSILON);

        if height_changed {
            for entry in &mut self.entries {
                let refreshed = outer_box(&entry.region, overlay_size, config);
                entry.outer = entry.outer.with_top(refreshed.top);
            }
        }

        for region in regions {
            if self.key_for(region).is_some() {
                continue;
            }

            let outer = outer_box(region, overlay_size, config);
            debug!(
                "registering region {:?} at ({}, {}) size {}x{}",
                region.id, outer.left, outer.top, outer.width, outer.height
            );
            self.entries.push(RegionEntry {
                region: Rc::clone(region),
                outer,
                inner_height: None,
                children: vec![],
                reported_height: 0.0,
            });
        }

        self.overlay_height = Some(overlay_size.1);
    }

    #[must_use]
    pub fn key_for(&self, region: &Rc<Region>) -> Option<RegionKey> {
        self.entries
            .iter()
            .position(|entry| Rc::ptr_eq(&entry.region, region))
            .map(RegionKey)
    }

    #[must_use]
    pub fn outer_box(&self, key: RegionKey) -> Option<LayoutBox> {
        self.entries.get(key.0).map(|entry| entry.outer)
    }

    #[must_use]
    pub fn inner_box(&self, key: RegionKey) -> Option<LayoutBox> {
        self.entries.get(key.0).map(RegionEntry::inner_box)
    }

    /// Append a cue box to the region's inner container, below the boxes already in it, and grow
    /// the tracked height by the box's height. Only the inline position of `cue_box` is kept.
    ///
    /// Returns the box's rectangle relative to the inner container.
    pub fn handle_region_cue(
        &mut self,
        key: RegionKey,
        handle: RenderHandle,
        cue_box: LayoutBox,
    ) -> Option<LayoutBox> {
        let entry = self.entries.get_mut(key.0)?;

        let offset = entry.content_height();
        let rect = LayoutBox::new(
            cue_box.left,
            offset,
            cue_box.width,
            cue_box.height,
            cue_box.line_height,
        );
        entry.children.push((handle, rect));
        entry.inner_height = Some(entry.inner_height.unwrap_or(offset) + rect.height);

        Some(rect)
    }

    /// Take a retired cue box out of whichever region holds it, shrinking the tracked height.
    /// The boxes below it move up to close the gap. Returns whether a region held it.
    pub fn remove_region_cue(&mut self, handle: RenderHandle) -> bool {
        for entry in &mut self.entries {
            if let Some(position) = entry.children.iter().position(|(child, _)| *child == handle) {
                let (_, rect) = entry.children.remove(position);
                entry.inner_height = entry
                    .inner_height
                    .map(|height| (height - rect.height).max(0.0));
                entry.restack();
                return true;
            }
        }

        false
    }

    /// Put an already laid out cue box back into the region's inner container, and let the
    /// container size itself to its content again.
    pub fn readd_region_cue(&mut self, key: RegionKey, handle: RenderHandle, rect: LayoutBox) {
        let Some(entry) = self.entries.get_mut(key.0) else {
            return;
        };

        if !entry.children.iter().any(|(child, _)| *child == handle) {
            entry.children.push((handle, rect));
        }
        entry.restack();
        entry.inner_height = None;
    }

    /// Whether the cue box `handle` is in the inner container of the region `key`.
    #[must_use]
    pub fn cue_in_region(&self, key: RegionKey, handle: RenderHandle) -> bool {
        self.cue_rect(key, handle).is_some()
    }

    /// Current rectangle of the cue box `handle` in the region `key`, relative to the inner
    /// container.
    #[must_use]
    pub fn cue_rect(&self, key: RegionKey, handle: RenderHandle) -> Option<LayoutBox> {
        self.entries
            .get(key.0)?
            .children
            .iter()
            .find(|(child, _)| *child == handle)
            .map(|(_, rect)| *rect)
    }

    /// Current geometry of every region. Each call reports height changes relative to the
    /// previous call.
    pub fn layouts(&mut self, config: &LayoutConfig) -> Vec<RegionLayout> {
        self.entries
            .iter_mut()
            .enumerate()
            .map(|(index, entry)| {
                let inner = entry.inner_box();
                let previous_inner_height = entry.reported_height;
                entry.reported_height = inner.height;

                let scrolls = entry.region.scroll == Scroll::Up;
                RegionLayout {
                    key: RegionKey(index),
                    id: entry.region.id.clone(),
                    outer: entry.outer,
                    inner,
                    previous_inner_height,
                    inner_height: entry.inner_height,
                    animate: scrolls && (previous_inner_height - inner.height).abs() > f64::EPSILON,
                    transition_seconds: if scrolls {
                        config.scroll_transition_seconds
                    } else {
                        0.0
                    },
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for RegionManager {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_list()
            .entries(self.entries.iter().map(|entry| &entry.region.id))
            .finish()
    }
}

fn outer_box(region: &Region, (width, height): (f64, f64), config: &LayoutConfig) -> LayoutBox {
    #[allow(clippy::cast_precision_loss, reason = "region line counts are small")]
    let lines = region.lines as f64;

    let region_width = width * region.width / 100.0;
    let region_height = (height / 100.0).round() * config.region_line_height_percent * lines;
    let left =
        width * region.viewport_anchor_x / 100.0 - region_width * region.region_anchor_x / 100.0;
    let top =
        height * region.viewport_anchor_y / 100.0 - region_height * region.region_anchor_y / 100.0;

    LayoutBox::new(left, top, region_width, region_height, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(regions: &[Rc<Region>], overlay: (f64, f64)) -> RegionManager {
        let mut manager = RegionManager::new();
        manager.setup_regions(regions, overlay, &LayoutConfig::default());
        manager
    }

    #[test]
    fn region_geometry() {
        let default = Rc::new(Region::default());
        let anchored = Rc::new(Region {
            id: "side".to_owned(),
            width: 40.0,
            lines: 2,
            region_anchor_x: 50.0,
            region_anchor_y: 0.0,
            viewport_anchor_x: 50.0,
            viewport_anchor_y: 10.0,
            scroll: Scroll::Up,
        });
        let manager = setup(&[Rc::clone(&default), Rc::clone(&anchored)], (1000.0, 500.0));

        let Some(key) = manager.key_for(&default) else {
            panic!("default region not registered");
        };
        assert_eq!(
            manager.outer_box(key),
            Some(LayoutBox::new(0.0, 410.0, 1000.0, 90.0, 0.0))
        );

        let Some(key) = manager.key_for(&anchored) else {
            panic!("anchored region not registered");
        };
        assert_eq!(
            manager.outer_box(key),
            Some(LayoutBox::new(300.0, 50.0, 400.0, 60.0, 0.0))
        );

        // Same contents, different region
        assert_eq!(manager.key_for(&Rc::new(Region::default())), None);
    }

    #[test]
    fn cues_stack_and_retire() {
        let region = Rc::new(Region::default());
        let mut manager = setup(&[Rc::clone(&region)], (1000.0, 500.0));
        let Some(key) = manager.key_for(&region) else {
            panic!("region not registered");
        };

        let first = manager.handle_region_cue(
            key,
            RenderHandle(1),
            LayoutBox::new(0.0, 0.0, 500.0, 30.0, 30.0),
        );
        let second = manager.handle_region_cue(
            key,
            RenderHandle(2),
            LayoutBox::new(100.0, 0.0, 500.0, 20.0, 20.0),
        );
        assert_eq!(first.map(|rect| rect.top), Some(0.0));
        assert_eq!(second.map(|rect| (rect.left, rect.top)), Some((100.0, 30.0)));
        assert!(manager.cue_in_region(key, RenderHandle(2)));

        let Some(inner) = manager.inner_box(key) else {
            panic!("no inner box");
        };
        assert_eq!(inner.height, 50.0);
        assert_eq!(inner.bottom, 500.0);

        assert!(manager.remove_region_cue(RenderHandle(1)));
        assert!(!manager.remove_region_cue(RenderHandle(1)));
        assert!(!manager.cue_in_region(key, RenderHandle(1)));
        assert_eq!(manager.inner_box(key).map(|inner| inner.height), Some(20.0));
        assert_eq!(
            manager.cue_rect(key, RenderHandle(2)),
            Some(LayoutBox::new(100.0, 0.0, 500.0, 20.0, 20.0))
        );

        manager.readd_region_cue(
            key,
            RenderHandle(3),
            LayoutBox::new(0.0, 50.0, 500.0, 10.0, 10.0),
        );
        assert_eq!(
            manager.cue_rect(key, RenderHandle(3)).map(|rect| rect.top),
            Some(20.0)
        );
        let layouts = manager.layouts(&LayoutConfig::default());
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].inner_height, None);
        assert_eq!(layouts[0].inner.height, 30.0);
    }

    #[test]
    fn scrolling_regions_animate() {
        let region = Rc::new(Region {
            scroll: Scroll::Up,
            ..Region::default()
        });
        let mut manager = setup(&[Rc::clone(&region)], (1000.0, 500.0));
        let Some(key) = manager.key_for(&region) else {
            panic!("region not registered");
        };

        manager.handle_region_cue(
            key,
            RenderHandle(1),
            LayoutBox::new(0.0, 0.0, 500.0, 30.0, 30.0),
        );
        let layouts = manager.layouts(&LayoutConfig::default());
        assert!(layouts[0].animate);
        assert_eq!(layouts[0].previous_inner_height, 0.0);
        assert_eq!(layouts[0].inner_height, Some(30.0));
        assert!((layouts[0].transition_seconds - 0.433).abs() < f64::EPSILON);

        let layouts = manager.layouts(&LayoutConfig::default());
        assert!(!layouts[0].animate);
        assert_eq!(layouts[0].previous_inner_height, 30.0);
    }

    #[test]
    fn overlay_resize_moves_regions_vertically() {
        let region = Rc::new(Region::default());
        let mut manager = setup(&[Rc::clone(&region)], (1000.0, 500.0));
        manager.setup_regions([&region], (2000.0, 1000.0), &LayoutConfig::default());

        let Some(key) = manager.key_for(&region) else {
            panic!("region not registered");
        };
        let Some(outer) = manager.outer_box(key) else {
            panic!("no outer box");
        };
        assert_eq!(outer.top, 820.0);
        assert_eq!(outer.width, 1000.0);
        assert_eq!(outer.height, 90.0);
    }
}
