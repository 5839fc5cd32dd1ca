//! Experiment runner - one request through the encode/render/upload stages

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::batch::{parse_date_time_rows, parse_scalar_aqi_rows};
use super::result::PLACEHOLDER_ACCURACY;
use super::{ArtifactRecord, ExperimentRequest, ExperimentResult, Stage, StageOutput, StageReport};
use crate::encoder::{
    BinaryEncoder, DateTimeEncoder, DateTimeEncoderConfig, DateTimePart, GeoSpatialEncoder,
    ScalarEncoder, ScalarEncoderConfig, SparseVector,
};
use crate::render::{render_grid, render_strip, Grid, GridShape, Palette, RenderSettings, TextOverlay};
use crate::storage::{indexed_file_name, StorageGateway};
use crate::Result;

/// Active bits of the AQI scalar encoder.
pub const AQI_WIDTH: usize = 21;
/// Output width of the AQI scalar encoder.
pub const AQI_TOTAL_BITS: usize = 100;

/// Knobs of the pipeline, usually projected from `WorkerConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// Target geometry of grid and strip renders
    pub render: RenderSettings,
    /// `N` of the primary binary encoder
    pub binary_bits: usize,
    /// Primary value used when the request carries none
    pub default_primary_value: String,
    /// Geospatial input used when the request carries none
    pub geo_latitude: f64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            binary_bits: 156,
            default_primary_value: "40148".to_string(),
            geo_latitude: 48.75,
        }
    }
}

/// Runs the stage pipeline for a request and assembles its result.
///
/// Stages run in a fixed order and are isolated from each other: a failing
/// stage is reported and the next one still runs. Storage failures are the
/// exception; they abort the experiment so the request can be redelivered.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sdr_bitmap::experiment::{ExperimentRequest, ExperimentRunner};
/// use sdr_bitmap::storage::MemoryStorageGateway;
///
/// # async fn example() -> sdr_bitmap::Result<()> {
/// let storage = Arc::new(MemoryStorageGateway::new());
/// let runner = ExperimentRunner::new(Arc::clone(&storage));
///
/// let result = runner.run(&ExperimentRequest::new("exp-1")).await?;
/// assert_eq!(result.test_name(), "SDR to Bitmap");
/// assert_eq!(storage.result_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ExperimentRunner<S> {
    storage: Arc<S>,
    settings: RunnerSettings,
}

impl<S: StorageGateway> ExperimentRunner<S> {
    /// Create a runner with default settings.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            settings: RunnerSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Get the storage gateway.
    #[must_use]
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Get the settings.
    #[must_use]
    pub const fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Process a request and upload its result record.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process); no record is uploaded on error.
    pub async fn run(&self, request: &ExperimentRequest) -> Result<ExperimentResult> {
        let result = self.process(request).await?;
        self.storage.upload_experiment_result(&result).await;
        Ok(result)
    }

    /// Run every stage for a request; artifacts are uploaded, the record is not.
    ///
    /// # Errors
    ///
    /// Returns the first transient storage error (`Error::is_transient`) hit
    /// by any stage. Every other stage failure is caught and reported in the
    /// result.
    pub async fn process(&self, request: &ExperimentRequest) -> Result<ExperimentResult> {
        let experiment_id = if request.experiment_id.trim().is_empty() {
            Utc::now().format("%Y%m%d%H%M%S%3f").to_string()
        } else {
            request.experiment_id.clone()
        };
        let result = ExperimentResult::builder(experiment_id)
            .named(request.name.as_str(), request.description.as_str())
            .build();

        let span = info_span!(
            "experiment",
            experiment_id = result.experiment_id(),
            row_key = result.row_key()
        );
        self.execute(request, result).instrument(span).await
    }

    async fn execute(&self, request: &ExperimentRequest, mut result: ExperimentResult) -> Result<ExperimentResult> {
        info!(input_file = %request.input_file, "Started experiment");

        let now = result.start_time_utc();
        let tag = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), result.row_key());
        let stages = self.run_stages(request, now, &tag).await?;
        let failed = stages.iter().filter(|s| s.is_failure()).count();
        let test_data = test_data(request, &stages);
        result.finish(stages, test_data, PLACEHOLDER_ACCURACY);

        info!(failed_stages = failed, "Finished experiment");
        Ok(result)
    }

    async fn run_stages(
        &self,
        request: &ExperimentRequest,
        now: DateTime<Utc>,
        tag: &str,
    ) -> Result<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(4);

        let mut out = StageOutput::default();
        let outcome = self.primary_stage(request, tag, &mut out).await;
        reports.push(conclude(Stage::Primary, outcome, out)?);

        let file = request.date_time_data_row.trim();
        reports.push(if file.is_empty() {
            StageReport::skipped(Stage::DateTime, "no DateTimeDataRow file")
        } else {
            let mut out = StageOutput::default();
            let outcome = self.date_time_stage(file, now, tag, &mut out).await;
            conclude(Stage::DateTime, outcome, out)?
        });

        let file = request.scalar_encoder_aqi.trim();
        reports.push(if file.is_empty() {
            StageReport::skipped(Stage::ScalarAqi, "no ScalarEncoderAQI file")
        } else {
            let mut out = StageOutput::default();
            let outcome = self.scalar_aqi_stage(file, tag, &mut out).await;
            conclude(Stage::ScalarAqi, outcome, out)?
        });

        let mut out = StageOutput::default();
        let outcome = self.geospatial_stage(request.value3, tag, &mut out).await;
        reports.push(conclude(Stage::GeoSpatial, outcome, out)?);

        Ok(reports)
    }

    async fn upload(&self, stage: Stage, name: String, png: Vec<u8>, out: &mut StageOutput) -> Result<()> {
        let size = png.len() as u64;
        self.storage.upload_result_file(&name, png).await?;
        out.artifacts.push(ArtifactRecord::new(stage, name, size));
        Ok(())
    }

    fn render(&self, sdr: &SparseVector, palette: Palette, label: Option<&TextOverlay>) -> Result<Vec<u8>> {
        let grid = Grid::reshape(sdr, render_shape(sdr.len()))?;
        let RenderSettings { width, height, .. } = self.settings.render;
        render_grid(&grid, width, height, palette, label)
    }

    async fn primary_stage(&self, request: &ExperimentRequest, tag: &str, out: &mut StageOutput) -> Result<()> {
        let value = match request.value1.trim() {
            "" => self.settings.default_primary_value.trim(),
            value => value,
        };
        let sdr = BinaryEncoder::new(self.settings.binary_bits)?.encode(value)?;

        let grid_png = self.render(&sdr, Palette::yellow_on_black(), Some(&TextOverlay::new(value)))?;
        let strip_png = render_strip(&sdr, self.settings.render.strip_scale, Palette::black_on_white())?;

        self.upload(
            Stage::Primary,
            format!("EncodedValueVisualization_BinaryEncoder_{tag}.png"),
            grid_png,
            out,
        )
        .await?;
        self.upload(Stage::Primary, format!("Draw1DBitmap_{tag}.png"), strip_png, out)
            .await?;

        out.detail = Some(json!({
            "value": value,
            "bits": sdr.len(),
            "activeBits": sdr.active_count(),
        }));
        Ok(())
    }

    async fn date_time_stage(
        &self,
        file: &str,
        now: DateTime<Utc>,
        tag: &str,
        out: &mut StageOutput,
    ) -> Result<()> {
        let rows = parse_date_time_rows(&self.storage.download_input_file(file).await?)?;
        let mut summaries = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            info!(row = index, w = row.w, r = row.r, input = %row.input, "DateTime row");

            let encoder = DateTimeEncoder::new(
                DateTimeEncoderConfig::full(now)
                    .with_part_width(DateTimePart::DateTime, row.w)
                    .with_part_radius(DateTimePart::DateTime, row.r),
            )?;
            let sdr = encoder.encode_str(&row.input)?;

            let matches = matches_expected(&sdr, &row.expected_output);
            match matches {
                Some(true) => debug!(row = index, "Encoding matches expected output"),
                Some(false) => info!(row = index, "Encoding differs from expected output"),
                None => {}
            }

            let png = self.render(&sdr, Palette::yellow_on_black(), None)?;
            let name = format!(
                "DateTimeBitMap_{}_{tag}_{}.png",
                file_safe(&row.input),
                index + 1
            );
            self.upload(Stage::DateTime, name, png, out).await?;
            summaries.push(json!({
                "input": row.input,
                "w": row.w,
                "r": row.r,
                "matchesExpected": matches,
            }));
        }

        out.detail = Some(json!({ "rows": summaries }));
        Ok(())
    }

    async fn scalar_aqi_stage(&self, file: &str, tag: &str, out: &mut StageOutput) -> Result<()> {
        let rows = parse_scalar_aqi_rows(&self.storage.download_input_file(file).await?)?;

        for (index, row) in rows.iter().enumerate() {
            info!(row = index, inputs = row.inputs.len(), min = row.min_value, max = row.max_value, "AQI row");

            let encoder = ScalarEncoder::new(
                ScalarEncoderConfig::new(AQI_WIDTH, AQI_TOTAL_BITS, row.min_value, row.max_value)
                    .named("ScalarEncoderAQI"),
            )?;
            let images = row
                .inputs
                .iter()
                .map(|&input| {
                    let sdr = encoder.encode(aqi_value(input))?;
                    self.render(&sdr, Palette::blue_on_white(), None)
                })
                .collect::<Result<Vec<_>>>()?;

            let base = format!("ScalarAQIBitmap_{tag}_{}", index + 1);
            let sizes: Vec<u64> = images.iter().map(|png| png.len() as u64).collect();
            self.storage.upload_result_files(&base, images).await?;

            out.artifacts.extend(sizes.into_iter().enumerate().map(|(i, size)| {
                ArtifactRecord::new(Stage::ScalarAqi, indexed_file_name(&base, i), size)
            }));
        }

        out.detail = Some(json!({ "rows": rows.len() }));
        Ok(())
    }

    async fn geospatial_stage(&self, latitude: Option<f64>, tag: &str, out: &mut StageOutput) -> Result<()> {
        let latitude = latitude.unwrap_or(self.settings.geo_latitude);
        let sdr = GeoSpatialEncoder::latitude_band()?.encode(latitude)?;
        let png = self.render(&sdr, Palette::yellow_on_black(), None)?;

        self.upload(Stage::GeoSpatial, format!("GeoSpatialBitmap_{tag}.png"), png, out)
            .await?;

        out.detail = Some(json!({ "latitude": latitude }));
        Ok(())
    }
}

/// Turn a stage outcome into its report.
///
/// Transient storage errors are passed through instead of being reported.
/// A failed report lists the files the stage uploaded before failing.
fn conclude(stage: Stage, outcome: Result<()>, output: StageOutput) -> Result<StageReport> {
    let err = match outcome {
        Ok(()) => {
            info!(stage = %stage, artifacts = output.artifacts.len(), "Stage succeeded");
            return Ok(StageReport::from_result(stage, Ok(output)));
        }
        Err(err) => err,
    };

    let uploaded: Vec<&str> = output.artifacts.iter().map(ArtifactRecord::file_name).collect();
    if err.is_transient() {
        error!(stage = %stage, error = %err, uploaded = ?uploaded, "Storage failure, abandoning experiment");
        return Err(err);
    }

    warn!(stage = %stage, kind = err.kind(), error = %err, uploaded = ?uploaded, "Stage failed");
    let report = StageReport::failed(stage, &err);
    Ok(if uploaded.is_empty() {
        report
    } else {
        report.with_detail(json!({ "uploaded": uploaded }))
    })
}

/// Square reshape when possible, otherwise the most balanced factor pair.
fn render_shape(len: usize) -> Option<GridShape> {
    GridShape::square(len).or_else(|| GridShape::balanced(len))
}

#[allow(clippy::cast_precision_loss)]
fn aqi_value(input: i64) -> f64 {
    input as f64
}

fn matches_expected(sdr: &SparseVector, expected: &[i32]) -> Option<bool> {
    if expected.is_empty() {
        return None;
    }
    Some(
        expected.len() == sdr.len()
            && sdr
                .bits()
                .iter()
                .zip(expected)
                .all(|(&bit, &want)| i32::from(bit) == want),
    )
}

fn file_safe(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn test_data(request: &ExperimentRequest, stages: &[StageReport]) -> String {
    let data = json!({
        "inputFile": request.input_file,
        "dateTimeFile": request.date_time_data_row,
        "aqiFile": request.scalar_encoder_aqi,
        "value1": request.value1,
        "value2": request.value2,
        "value3": request.value3,
        "stages": stages,
    });
    serde_json::to_string_pretty(&data).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialize test data");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorageGateway;

    fn runner() -> (Arc<MemoryStorageGateway>, ExperimentRunner<MemoryStorageGateway>) {
        let storage = Arc::new(MemoryStorageGateway::new());
        let settings = RunnerSettings {
            render: RenderSettings {
                width: 64,
                height: 64,
                strip_scale: 2,
            },
            ..RunnerSettings::default()
        };
        let runner = ExperimentRunner::new(Arc::clone(&storage)).with_settings(settings);
        (storage, runner)
    }

    #[test]
    fn test_render_shape() {
        assert_eq!(render_shape(100), Some(GridShape::new(10, 10)));
        assert_eq!(render_shape(156), Some(GridShape::new(12, 13)));
        assert_eq!(render_shape(0), None);
    }

    #[test]
    fn test_matches_expected() {
        let sdr = SparseVector::from_bits([0, 1, 1]);
        assert_eq!(matches_expected(&sdr, &[]), None);
        assert_eq!(matches_expected(&sdr, &[0, 1, 1]), Some(true));
        assert_eq!(matches_expected(&sdr, &[0, 1]), Some(false));
        assert_eq!(matches_expected(&sdr, &[1, 1, 1]), Some(false));
    }

    #[test]
    fn test_file_safe() {
        assert_eq!(file_safe("2024-06-01 10:00:00"), "2024-06-01_10_00_00");
        assert_eq!(file_safe("../x"), "___x");
    }

    #[test]
    fn test_conclude_passes_transient_errors_through() {
        let output = StageOutput {
            artifacts: vec![ArtifactRecord::new(Stage::Primary, "grid.png", 10)],
            detail: None,
        };

        let err = conclude(
            Stage::Primary,
            Err(crate::Error::TransientIo("down".to_string())),
            output.clone(),
        )
        .unwrap_err();
        assert!(err.is_transient());

        let report = conclude(
            Stage::Primary,
            Err(crate::Error::Shape("bad".to_string())),
            output,
        )
        .unwrap();
        assert!(report.is_failure());
        assert_eq!(report.detail().unwrap()["uploaded"][0], "grid.png");
    }

    #[tokio::test]
    async fn test_empty_experiment_id_gets_stamp() {
        let (_, runner) = runner();
        let result = runner.process(&ExperimentRequest::new("")).await.unwrap();
        assert_eq!(result.experiment_id().len(), 17);
        assert!(result.experiment_id().chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_process_does_not_store_record() {
        let (storage, runner) = runner();
        let result = runner.process(&ExperimentRequest::new("exp")).await.unwrap();
        assert_eq!(storage.result_count(), 0);
        // primary strip + grid, geospatial grid
        assert_eq!(storage.artifact_count(), 3);
        assert_eq!(result.stages().len(), 4);
    }

    #[tokio::test]
    async fn test_bad_primary_value_fails_only_primary() {
        let (storage, runner) = runner();
        let request = ExperimentRequest::new("exp").value("not a number");

        let result = runner.process(&request).await.unwrap();

        assert!(result.stages()[0].is_failure());
        assert!(result.stages()[3].is_success());
        assert_eq!(storage.artifact_count(), 1);
        assert!((result.accuracy() - PLACEHOLDER_ACCURACY).abs() < f64::EPSILON);
    }
}
