use std::hint::black_box;
use std::iter;

use criterion::{BatchSize, Criterion};
use rand::prelude::*;
use webvtt_cues::cue::{Cue, CueIndex, CueTrack};

struct CueSource {
    count: usize,
    max_start_seconds: f64,
    max_duration_seconds: f64,
    rng: rand_pcg::Mcg128Xsl64,
}

impl CueSource {
    fn new(count: usize) -> Self {
        let max_duration_seconds = 20.0_f64.min(count as f64 / 2.0);

        Self {
            rng: rand_pcg::Mcg128Xsl64::new(1),
            count,
            max_start_seconds: count as f64 - max_duration_seconds,
            max_duration_seconds,
        }
    }

    fn next_cue(&mut self) -> Cue {
        let start = self.random_time();
        let duration = self.rng.random_range(0.0..self.max_duration_seconds);
        Cue::new(start, start + duration, "Sphinx of black quartz, judge my vow.")
    }

    fn collect(&mut self) -> Vec<Cue> {
        let count = self.count;
        iter::repeat_with(|| self.next_cue()).take(count).collect()
    }

    fn random_time(&mut self) -> f64 {
        self.rng.random_range(0.0..self.max_start_seconds)
    }
}

pub fn benchmark_create(c: &mut Criterion) {
    fn perform_bench(c: &mut Criterion, count: usize) {
        c.bench_function(format!("create track: {count} cues").as_str(), |b| {
            let data = CueSource::new(count).collect();
            b.iter(|| {
                let track: CueTrack = data.iter().cloned().collect();
                assert_eq!(track.len(), count);
            });
        });
    }

    perform_bench(c, 100);
    perform_bench(c, 1000);
    perform_bench(c, 10000);
}

pub fn benchmark_push_remove(c: &mut Criterion) {
    c.bench_function("push 100 cues onto track with 10k cues", |b| {
        b.iter_batched_ref(
            || {
                let mut source = CueSource::new(10000);
                let track: CueTrack = source.collect().into_iter().collect();
                let additional: Vec<_> = (0..100).map(|_| source.next_cue()).collect();
                (track, additional)
            },
            |(track, additional)| {
                let original_count = track.len();
                for cue in additional.iter() {
                    track.push(cue.clone());
                }
                assert_eq!(track.len(), original_count + 100);
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("remove 100 cues from track with 10k cues", |b| {
        b.iter_batched_ref(
            || {
                let track: CueTrack = CueSource::new(10000).collect().into_iter().collect();
                let indices: Vec<CueIndex> = track.iter_in_order().step_by(100).collect();
                (track, indices)
            },
            |(track, indices)| {
                for index in indices.iter() {
                    black_box(track.remove(*index));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

pub fn benchmark_active(c: &mut Criterion) {
    fn perform_bench(c: &mut Criterion, count: usize) {
        c.bench_function(format!("active cues with {count} cues").as_str(), |b| {
            let mut source = CueSource::new(count);
            let track: CueTrack = source.collect().into_iter().collect();
            b.iter_batched(
                || source.random_time(),
                |time| black_box(track.active_at(time)),
                BatchSize::SmallInput,
            )
        });
    }

    perform_bench(c, 100);
    perform_bench(c, 10000);
    perform_bench(c, 1000000);
}
