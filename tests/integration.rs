//! End-to-end flows: load, partition, fan out, reassemble.

use anyhow::Result;
use fanout::testing::{FrameBuilder, assert_frames_equal};
use fanout::validation::assert_single_group;
use fanout::{Runner, TimeseriesFrame, run_parallel};

/// Opt-in log output for debugging test runs (RUST_LOG=debug).
fn init_logs() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn scenario_archive() -> TimeseriesFrame {
    let mut builder = FrameBuilder::new(
        &["model", "scenario", "region", "variable", "unit"],
        &[2020, 2030, 2050],
    );
    for (model, scenario) in [
        ("AIM/CGE 2.2", "EN_NPi2020_900f"),
        ("GCAM 5.3", "NGFS2_Current Policies"),
        ("WITCH 5.0", "CO_Bridge"),
    ] {
        builder = builder
            .row(
                &[model, scenario, "World", "Emissions|CO2", "Mt CO2/yr"],
                &[38.0, 35.0, 20.0],
            )
            .row(
                &[model, scenario, "World", "Emissions|CH4", "Mt CH4/yr"],
                &[350.0, 320.0, 250.0],
            );
    }
    builder.build()
}

/// A per-group transform in the domain's shape: guard first, then rescale.
fn halve_guarded(group: TimeseriesFrame) -> Result<TimeseriesFrame> {
    assert_single_group(&group)?;
    let mut out = TimeseriesFrame::new(group.dimensions().to_vec(), group.years().to_vec())?;
    for row in group.rows() {
        out.push_row(row.key.clone(), row.values.iter().map(|v| v / 2.0).collect())?;
    }
    Ok(out)
}

#[test]
fn serial_and_pool_paths_agree_end_to_end() -> Result<()> {
    init_logs();
    let archive = scenario_archive();

    let serial = Runner::new(1).run(halve_guarded, archive.split_groups(), "groups")?;
    let pooled = Runner::new(3).run(halve_guarded, archive.split_groups(), "groups")?;

    assert_eq!(serial.len(), 3);
    assert_eq!(pooled.len(), 3);

    // Pool output arrives in completion order; compare keyed, not positional.
    let serial_frame = TimeseriesFrame::concat(&serial)?;
    let pooled_frame = TimeseriesFrame::concat(&pooled)?;
    assert_frames_equal(&pooled_frame, &serial_frame, 1e-12);

    // And the transform actually ran.
    assert!((serial_frame.rows()[0].values[0] - 19.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn a_group_spanning_two_scenarios_fails_the_whole_call() {
    init_logs();
    let archive = scenario_archive();

    // Dispatch the unsplit archive as one "group": the guard inside the
    // callable must reject it and the failure must reach the caller.
    for degree in [1, 2] {
        let res = Runner::new(degree).run(halve_guarded, vec![archive.clone()], "unsplit");
        let err = res.expect_err("unsplit archive must fail the guard");
        assert!(
            err.to_string().contains("variable and unit"),
            "got: {err}"
        );
    }
}

#[cfg(feature = "io-csv")]
#[test]
fn csv_to_fanout_round_trip() -> Result<()> {
    use fanout::testing::temp_frame_csv;

    init_logs();
    let archive = scenario_archive();
    let (_dir, path) = temp_frame_csv(&archive)?;

    let loaded =
        fanout::read_timeseries_csv(&path, &["model", "scenario", "region", "variable", "unit"])?;
    let halved = run_parallel(halve_guarded, loaded.split_groups(), "halve", 2)?;

    let mut expected = TimeseriesFrame::new(
        archive.dimensions().to_vec(),
        archive.years().to_vec(),
    )?;
    for row in archive.rows() {
        expected.push_row(row.key.clone(), row.values.iter().map(|v| v / 2.0).collect())?;
    }

    assert_frames_equal(&TimeseriesFrame::concat(&halved)?, &expected, 1e-12);
    Ok(())
}
