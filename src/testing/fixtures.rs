//! Test data builders and fixture datasets.

use crate::frame::TimeseriesFrame;

/// Fluent builder for test frames.
///
/// Arity mistakes panic at build time with the frame's own error message;
/// this is test-side code, so failing loudly is the point.
///
/// # Example
///
/// ```
/// use fanout::testing::FrameBuilder;
///
/// let frame = FrameBuilder::new(&["model", "scenario", "variable", "unit"], &[2020, 2030])
///     .row(&["AIM", "SSP2", "Emissions|CO2", "Mt CO2/yr"], &[38.0, 41.5])
///     .build();
/// assert_eq!(frame.len(), 1);
/// ```
pub struct FrameBuilder {
    frame: TimeseriesFrame,
}

impl FrameBuilder {
    /// Start a frame with the given dimensions and year columns.
    ///
    /// # Panics
    ///
    /// Panics if the dimension list is empty or has duplicates.
    #[must_use]
    pub fn new(dimensions: &[&str], years: &[i32]) -> Self {
        let frame = TimeseriesFrame::new(
            dimensions.iter().map(|d| (*d).to_string()).collect(),
            years.to_vec(),
        )
        .unwrap_or_else(|e| panic!("FrameBuilder::new: {e}"));
        Self { frame }
    }

    /// Append a row.
    ///
    /// # Panics
    ///
    /// Panics if key or value arity disagrees with the frame shape.
    #[must_use]
    pub fn row(mut self, key: &[&str], values: &[f64]) -> Self {
        self.frame
            .push_row(
                key.iter().map(|k| (*k).to_string()).collect(),
                values.to_vec(),
            )
            .unwrap_or_else(|e| panic!("FrameBuilder::row: {e}"));
        self
    }

    #[must_use]
    pub fn build(self) -> TimeseriesFrame {
        self.frame
    }
}

/// The AR6 illustrative pathway scenarios, as `(model, scenario)` pairs.
///
/// A convenient fixture set: real model and scenario names with the
/// slashes, spaces, and mixed casing archive data actually carries.
#[must_use]
pub fn illustrative_pathways() -> Vec<(String, String)> {
    [
        ("AIM/CGE 2.2", "EN_NPi2020_900f"),
        ("COFFEE 1.1", "EN_NPi2020_400f_lowBECCS"),
        ("GCAM 5.3", "NGFS2_Current Policies"),
        ("IMAGE 3.0", "EN_INDCi2030_3000f"),
        ("MESSAGEix-GLOBIOM 1.0", "LowEnergyDemand_1.3_IPCC"),
        ("MESSAGEix-GLOBIOM_GEI 1.0", "SSP2_openres_lc_50"),
        ("REMIND-MAgPIE 2.1-4.2", "SusDev_SDP-PkBudg1000"),
        ("REMIND-MAgPIE 2.1-4.3", "DeepElec_SSP2_ HighRE_Budg900"),
        ("WITCH 5.0", "CO_Bridge"),
    ]
    .into_iter()
    .map(|(m, s)| (m.to_string(), s.to_string()))
    .collect()
}

/// Derive one `(model, scenario)` test case per combination present in a
/// frame, in first-encounter order.
///
/// Combinations are returned empty when the frame lacks a `model` or
/// `scenario` dimension.
#[must_use]
pub fn model_scenario_cases(frame: &TimeseriesFrame) -> Vec<(String, String)> {
    if frame.dimension_index("model").is_none() || frame.dimension_index("scenario").is_none() {
        return Vec::new();
    }
    frame
        .unique_joint(&["model", "scenario"])
        .into_iter()
        .map(|mut combo| {
            let scenario = combo.pop().unwrap_or_default();
            let model = combo.pop().unwrap_or_default();
            (model, scenario)
        })
        .collect()
}
