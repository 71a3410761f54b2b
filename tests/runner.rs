use anyhow::{Result, anyhow};
use fanout::testing::{ProgressEvent, RecordingProgress, assert_same_elements};
use fanout::{Phase, Runner, StartMethod, run_parallel, suggest_degree};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn quiet(degree: usize) -> Runner {
    Runner::new(degree)
}

#[test]
fn serial_preserves_input_order() -> Result<()> {
    let out = run_parallel(|x: i32| Ok(x * 2), vec![1, 2, 3], "double", 1)?;
    assert_eq!(out, vec![2, 4, 6]);
    Ok(())
}

#[test]
fn pool_output_is_the_serial_multiset() -> Result<()> {
    let items: Vec<i64> = (0..100).collect();
    let serial = quiet(1).run(|x: i64| Ok(x * 3), items.clone(), "triple")?;
    let pooled = quiet(4).run(|x: i64| Ok(x * 3), items, "triple")?;

    assert_eq!(pooled.len(), serial.len());
    assert_same_elements(pooled, serial);
    Ok(())
}

#[test]
fn small_end_to_end_double() -> Result<()> {
    let out = run_parallel(|x: i32| Ok(x * 2), vec![1, 2, 3], "double", 2)?;
    assert_eq!(out.len(), 3);
    assert_same_elements(out, vec![2, 4, 6]);
    Ok(())
}

#[test]
fn degree_zero_is_rejected() {
    let res = quiet(0).run(|x: i32| Ok(x), vec![1], "noop");
    let err = res.expect_err("degree 0 must be rejected");
    assert!(err.to_string().contains("degree"), "got: {err}");
}

#[test]
fn empty_input_yields_empty_output_in_both_modes() -> Result<()> {
    let serial: Vec<i32> = quiet(1).run(|x: i32| Ok(x), Vec::new(), "empty")?;
    let pooled: Vec<i32> = quiet(4).run(|x: i32| Ok(x), Vec::new(), "empty")?;
    assert!(serial.is_empty());
    assert!(pooled.is_empty());
    Ok(())
}

/// The Rust rendition of dispatching `[1, 2, "x"]` into `v + 1`: one poison
/// item whose failure must reach the caller in both modes.
#[test]
fn poison_item_propagates_in_both_modes() {
    let func = |x: i32| {
        if x == 2 {
            Err(anyhow!("cannot add 1 to a string"))
        } else {
            Ok(x + 1)
        }
    };

    for degree in [1, 3] {
        let res = quiet(degree).run(func, vec![1, 2, 3], "increment");
        let err = res.expect_err("the poison item must fail the call");
        assert_eq!(err.to_string(), "cannot add 1 to a string");
    }
}

#[test]
fn error_is_not_wrapped_and_stays_downcastable() {
    #[derive(Debug)]
    struct Marker;
    impl std::fmt::Display for Marker {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "marker")
        }
    }
    impl std::error::Error for Marker {}

    let res = quiet(2).run(
        |x: i32| if x == 1 { Err(Marker.into()) } else { Ok(x) },
        vec![0, 1, 2],
        "marked",
    );
    let err = res.expect_err("marker must fail the call");
    assert!(err.downcast_ref::<Marker>().is_some());
}

#[test]
fn explicit_fresh_start_method_completes() -> Result<()> {
    let out = quiet(3)
        .with_start_method(StartMethod::Fresh)
        .run(|x: u32| Ok(x + 10), vec![1, 2, 3, 4], "fresh")?;
    assert_same_elements(out, vec![11, 12, 13, 14]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn explicit_inherit_start_method_completes() -> Result<()> {
    let out = quiet(3)
        .with_start_method(StartMethod::Inherit)
        .run(|x: u32| Ok(x + 10), vec![1, 2, 3, 4], "inherit")?;
    assert_same_elements(out, vec![11, 12, 13, 14]);
    Ok(())
}

#[test]
fn default_start_method_resolution_never_errors() -> Result<()> {
    // No explicit method: resolution must silently pick a working one.
    let out = quiet(2).run(|x: i32| Ok(-x), vec![5, 6], "negate")?;
    assert_same_elements(out, vec![-5, -6]);
    Ok(())
}

#[test]
fn callable_sees_shared_captured_state() -> Result<()> {
    let offset = 100i64;
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in = Arc::clone(&calls);

    let out = quiet(4).run(
        move |x: i64| {
            calls_in.fetch_add(1, Ordering::Relaxed);
            Ok(x + offset)
        },
        vec![1, 2, 3, 4, 5],
        "offset",
    )?;

    assert_eq!(calls.load(Ordering::Relaxed), 5);
    assert_same_elements(out, vec![101, 102, 103, 104, 105]);
    Ok(())
}

#[test]
fn panicking_task_surfaces_as_error_in_pool_mode() {
    let res = quiet(2).run(
        |x: i32| {
            if x == 7 {
                panic!("boom on seven");
            }
            Ok(x)
        },
        vec![1, 7, 3],
        "panicky",
    );
    let err = res.expect_err("a panicking task must fail the call");
    assert!(err.to_string().contains("boom on seven"), "got: {err}");
}

#[test]
fn serial_run_reports_serial_phase_only() -> Result<()> {
    let progress = Arc::new(RecordingProgress::new());
    quiet(1)
        .with_progress(Arc::clone(&progress) as Arc<dyn fanout::Progress>)
        .run(|x: i32| Ok(x), vec![1, 2, 3], "items")?;

    let events = progress.events();
    assert_eq!(
        events.first(),
        Some(&ProgressEvent::Begin(Phase::Serial, "items".to_string(), 3))
    );
    assert_eq!(progress.advances(Phase::Serial), 3);
    assert_eq!(events.last(), Some(&ProgressEvent::Finish(Phase::Serial)));
    assert_eq!(progress.advances(Phase::Submit), 0);
    assert_eq!(progress.advances(Phase::Retrieve), 0);
    Ok(())
}

#[test]
fn pool_run_reports_submit_then_retrieve() -> Result<()> {
    let progress = Arc::new(RecordingProgress::new());
    quiet(2)
        .with_progress(Arc::clone(&progress) as Arc<dyn fanout::Progress>)
        .run(|x: i32| Ok(x), vec![1, 2, 3, 4], "items")?;

    assert_eq!(progress.advances(Phase::Submit), 4);
    assert_eq!(progress.advances(Phase::Retrieve), 4);
    assert_eq!(progress.advances(Phase::Serial), 0);

    // Submission completes before retrieval starts.
    let events = progress.events();
    let submit_finish = events
        .iter()
        .position(|e| *e == ProgressEvent::Finish(Phase::Submit))
        .expect("submit phase must finish");
    let retrieve_begin = events
        .iter()
        .position(|e| matches!(e, ProgressEvent::Begin(Phase::Retrieve, _, _)))
        .expect("retrieve phase must begin");
    assert!(submit_finish < retrieve_begin);
    Ok(())
}

#[test]
fn empty_pool_run_still_pairs_begin_and_finish() -> Result<()> {
    let progress = Arc::new(RecordingProgress::new());
    let out: Vec<i32> = quiet(4)
        .with_progress(Arc::clone(&progress) as Arc<dyn fanout::Progress>)
        .run(|x: i32| Ok(x), Vec::new(), "empty")?;
    assert!(out.is_empty());

    let events = progress.events();
    for phase in [Phase::Submit, Phase::Retrieve] {
        assert!(events.iter().any(|e| matches!(e, ProgressEvent::Begin(p, _, 0) if *p == phase)));
        assert!(events.contains(&ProgressEvent::Finish(phase)));
    }
    Ok(())
}

#[test]
fn suggest_degree_stays_within_bounds() {
    assert_eq!(suggest_degree(0), 1);
    assert_eq!(suggest_degree(1), 1);
    let d = suggest_degree(10_000);
    assert!(d >= 1);
    assert!(d <= num_cpus::get());
}
