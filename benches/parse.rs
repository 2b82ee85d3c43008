use std::fmt::Write;
use std::hint::black_box;

use criterion::{BatchSize, Criterion, Throughput};
use webvtt_cues::{Collector, Parser, markup};

const SAMPLE: &str = include_str!("../test_files/sample.vtt");

/// A document with `count` cues, each with settings and a bit of markup.
fn generate_document(count: usize) -> String {
    let mut document = String::from("WEBVTT\n\nREGION\nid:r width:40% scroll:up\n\n");
    for index in 0..count {
        let seconds = index * 2;
        writeln!(
            document,
            "{index}\n00:{:02}:{:02}.000 --> 00:{:02}:{:02}.500 line:-2 position:40%,start align:left{}\n\
             <v Speaker {index}>Line number <b>{index}</b> &amp; some <i>more</i> text\n",
            seconds / 60 % 60,
            seconds % 60,
            (seconds + 1) / 60 % 60,
            (seconds + 1) % 60,
            if index % 3 == 0 { " region:r" } else { "" },
        )
        .unwrap();
    }
    document
}

pub fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for count in [10, 1000] {
        let document = generate_document(count);
        group.throughput(Throughput::Bytes(document.len() as u64));
        group.bench_function(format!("{count} cues, one chunk"), |b| {
            b.iter_batched_ref(
                Collector::new,
                |collector| {
                    Parser::new()
                        .parse_all(black_box(document.as_bytes()), collector)
                        .unwrap();
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("{count} cues, 16 byte chunks"), |b| {
            b.iter_batched_ref(
                Collector::new,
                |collector| {
                    let mut parser = Parser::new();
                    for chunk in document.as_bytes().chunks(16) {
                        parser.parse(black_box(chunk), collector).unwrap();
                    }
                    parser.flush(collector).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));
    group.bench_function("sample document", |b| {
        b.iter_batched_ref(
            Collector::new,
            |collector| {
                Parser::new()
                    .parse_all(black_box(SAMPLE.as_bytes()), collector)
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

pub fn benchmark_markup(c: &mut Criterion) {
    const NO_TAGS: &str = "Sphinx of black quartz, judge my vow.";
    const FEW_TAGS: &str = "<v Narrator>Sphinx of <i>black</i> quartz, judge my vow.</v>";
    const MANY_TAGS: &str = "<c.yellow.bg_blue>Sphinx</c> <b>of</b> <i>black</i> <u>quartz</u>, \
        <ruby>judge<rt>jʌdʒ</rt></ruby> <lang en>my</lang> <00:00:01.000>vow &amp; \
        <v.loud Narrator>again &lt;and&gt; again</v>";

    c.bench_function("markup: no tags", |b| {
        b.iter(|| markup::parse(black_box(NO_TAGS)))
    });
    c.bench_function("markup: few tags", |b| {
        b.iter(|| markup::parse(black_box(FEW_TAGS)))
    });
    c.bench_function("markup: many tags", |b| {
        b.iter(|| markup::parse(black_box(MANY_TAGS)))
    });
}
