use std::collections::HashMap;
use std::rc::Rc;

use criterion::{BatchSize, Criterion};
use webvtt_cues::layout::{BoxMetrics, CueBoxRequest, LayoutBox, Parent, RenderHandle};
use webvtt_cues::{Cue, LayoutEngine, Region, Renderer};

/// Measures text by counting lines, like a monospace renderer would.
#[derive(Default)]
struct CountingRenderer {
    next_handle: u64,
    attached: HashMap<RenderHandle, Parent>,
}

impl Renderer for CountingRenderer {
    fn build_cue_box(&mut self, request: &CueBoxRequest<'_>) -> (RenderHandle, BoxMetrics) {
        self.next_handle += 1;
        let lines = request.markup.text_content().lines().count().max(1);
        (
            RenderHandle(self.next_handle),
            BoxMetrics {
                block_size: lines as f64 * request.font_size * 1.2,
                line_height: request.font_size * 1.2,
            },
        )
    }

    fn attach(&mut self, handle: RenderHandle, parent: Parent, _rect: LayoutBox) {
        self.attached.insert(handle, parent);
    }

    fn detach(&mut self, handle: RenderHandle) {
        self.attached.remove(&handle);
    }

    fn parent_of(&self, handle: RenderHandle) -> Option<Parent> {
        self.attached.get(&handle).copied()
    }

    fn overlay_size(&self) -> (f64, f64) {
        (1920.0, 1080.0)
    }
}

fn cues(count: usize, region: Option<&Rc<Region>>) -> Vec<Cue> {
    (0..count)
        .map(|index| {
            let mut cue = Cue::new(0.0, 10.0, &format!("<v Speaker>cue number {index}</v>"));
            cue.region = region.map(Rc::downgrade);
            cue
        })
        .collect()
}

pub fn benchmark_layout(c: &mut Criterion) {
    for count in [2, 10, 50] {
        c.bench_function(format!("layout {count} stacked cues").as_str(), |b| {
            b.iter_batched(
                || (LayoutEngine::default(), CountingRenderer::default(), cues(count, None)),
                |(mut engine, mut renderer, mut cues)| {
                    engine.process_cues(&mut renderer, &mut cues, &[])
                },
                BatchSize::SmallInput,
            )
        });
    }

    c.bench_function("relayout 10 unchanged cues", |b| {
        b.iter_batched(
            || {
                let mut engine = LayoutEngine::default();
                let mut renderer = CountingRenderer::default();
                let mut cues = cues(10, None);
                engine.process_cues(&mut renderer, &mut cues, &[]);
                (engine, renderer, cues)
            },
            |(mut engine, mut renderer, mut cues)| {
                engine.process_cues(&mut renderer, &mut cues, &[])
            },
            BatchSize::SmallInput,
        )
    });

    let region = Rc::new(Region {
        id: "r".to_owned(),
        ..Region::default()
    });
    c.bench_function("layout 10 cues in a region", |b| {
        b.iter_batched(
            || {
                (
                    LayoutEngine::default(),
                    CountingRenderer::default(),
                    cues(10, Some(&region)),
                )
            },
            |(mut engine, mut renderer, mut cues)| {
                engine.process_cues(&mut renderer, &mut cues, std::slice::from_ref(&region))
            },
            BatchSize::SmallInput,
        )
    });
}
