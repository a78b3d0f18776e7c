use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use wintrack::config::TrackerConfig;
use wintrack::platform::{FakeWindow, InMemoryProcessInspector, InMemoryWindowSystem};
use wintrack::{RawEventKind, RawWindowEvent, WindowHandle, WindowTracker};

fn desktop(count: isize) -> (Arc<InMemoryWindowSystem>, WindowTracker) {
    let windows = Arc::new(InMemoryWindowSystem::default());
    for raw in 1..=count {
        let window = FakeWindow::new(format!("Window {}", raw));
        let window = if raw % 3 == 0 { window.maximized() } else { window };
        windows.open(WindowHandle::new(raw), window);
    }

    let mut config = TrackerConfig::default();
    config.tracker.describe_maximized = false;
    let tracker = WindowTracker::new(
        windows.clone(),
        Arc::new(InMemoryProcessInspector::default()),
        &config,
    );
    (windows, tracker)
}

fn benchmark_raw_event_dispatch(c: &mut Criterion) {
    let (_windows, tracker) = desktop(64);
    tracker.sort_current_windows().unwrap();
    let foreground = RawWindowEvent::for_window(WindowHandle::new(1), RawEventKind::ForegroundChanged);
    let location = RawWindowEvent::for_window(WindowHandle::new(3), RawEventKind::LocationChanged);

    c.bench_function("dispatch_foreground", |b| {
        b.iter(|| black_box(tracker.handle_raw_event(black_box(foreground))))
    });
    c.bench_function("dispatch_location_tracked", |b| {
        b.iter(|| black_box(tracker.handle_raw_event(black_box(location))))
    });
}

fn benchmark_cold_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_current_windows");
    for count in [16_isize, 128, 512] {
        let (_windows, tracker) = desktop(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(tracker.sort_current_windows().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_raw_event_dispatch, benchmark_cold_start);
criterion_main!(benches);
