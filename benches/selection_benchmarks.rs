use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use tubequeue::downloader::sanitize_title;
use tubequeue::extractor::{Track, TrackKind};
use tubequeue::selection::{parse_selection, TrackSelector};

fn random_tracks(count: usize) -> Vec<Track> {
    let mut rng = rand::thread_rng();
    let heights = [144, 240, 360, 480, 720, 1080, 1440, 2160];
    let video_codecs = ["avc1.640028", "vp09.00.40.08", "av01.0.08M.08"];
    let audio_codecs = ["mp4a.40.2", "mp4a.40.5", "opus"];

    (0..count)
        .map(|i| {
            if rng.gen_bool(0.6) {
                Track {
                    format_id: i.to_string(),
                    codec: video_codecs[rng.gen_range(0..video_codecs.len())].to_string(),
                    kind: TrackKind::VideoOnly,
                    height: Some(heights[rng.gen_range(0..heights.len())]),
                    abr: None,
                    filesize: Some(rng.gen_range(1_000..100_000_000)),
                    language: None,
                }
            } else {
                Track {
                    format_id: i.to_string(),
                    codec: audio_codecs[rng.gen_range(0..audio_codecs.len())].to_string(),
                    kind: TrackKind::AudioOnly,
                    height: None,
                    abr: Some(rng.gen_range(32.0..320.0)),
                    filesize: Some(rng.gen_range(1_000..10_000_000)),
                    language: Some(if rng.gen_bool(0.5) { "en" } else { "de" }.to_string()),
                }
            }
        })
        .collect()
}

fn benchmark_track_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("Track Selection");

    for count in [10, 50, 200] {
        let tracks = random_tracks(count);
        group.bench_function(format!("video/{}", count), |b| {
            b.iter(|| TrackSelector::select_video(black_box(&tracks)))
        });
        group.bench_function(format!("audio_lang/{}", count), |b| {
            b.iter(|| TrackSelector::select_audio(black_box(&tracks), black_box(Some("en"))))
        });
    }

    group.finish();
}

fn benchmark_range_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Range Parsing");

    group.bench_function("simple", |b| {
        b.iter(|| parse_selection(black_box("1-10, 15, 20-25"), black_box(100)))
    });

    group.bench_function("all", |b| {
        b.iter(|| parse_selection(black_box("all"), black_box(5_000)))
    });

    let mut rng = rand::thread_rng();
    let many = (0..200)
        .map(|_| {
            let a = rng.gen_range(1..1_000);
            let b = rng.gen_range(1..1_000);
            format!("{}-{}", a, b)
        })
        .collect::<Vec<_>>()
        .join(",");
    group.bench_function("many_ranges", |b| {
        b.iter(|| parse_selection(black_box(&many), black_box(1_000)))
    });

    group.finish();
}

fn benchmark_sanitize_title(c: &mut Criterion) {
    let mut group = c.benchmark_group("Title Sanitization");
    let long = "AC/DC \\ Live ".repeat(40);

    group.bench_function("short", |b| {
        b.iter(|| sanitize_title(black_box("My Video (2024) [1080p]")))
    });
    group.bench_function("long", |b| b.iter(|| sanitize_title(black_box(&long))));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_track_selection,
    benchmark_range_parsing,
    benchmark_sanitize_title
);
criterion_main!(benches);
