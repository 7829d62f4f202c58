// camchain_est/src/batch.rs

//! Drives every sensor of every sample through one optimizer iteration.
//!
//! A failure inside one sample (a missing parameter, a non-positive-definite
//! covariance block, ...) excludes that sample from the iteration and is
//! recorded; the remaining samples are still evaluated.

use nalgebra::DVector;
use std::path::Path;
use tracing::{info, warn};

use camchain_core::error::CalibError;
use camchain_core::prelude::{
    CalibrationSample, CameraChainBundler, Capabilities, ParameterSnapshot, SensorModel,
    SparsityMap, TargetPoint,
};

use crate::config::{load_samples_from_dir, EstimationConfig};
use crate::error::{EstError, Result};

/// Why a sample was left out of an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub sample_index: usize,
    /// The sensor that failed, when the failure can be pinned on one.
    pub sensor_id: Option<String>,
    pub error: CalibError,
}

/// The stacked, whitened residual of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResidual {
    pub sample_index: usize,
    pub residual: DVector<f64>,
}

/// Everything one call to [`BatchEvaluator::evaluate`] produced.
#[derive(Debug, Clone, Default)]
pub struct IterationReport {
    pub residuals: Vec<SampleResidual>,
    pub failures: Vec<SampleFailure>,
}

impl IterationReport {
    /// All whitened residuals concatenated in sample order.
    pub fn stacked(&self) -> DVector<f64> {
        let len = self.residuals.iter().map(|r| r.residual.len()).sum();
        DVector::from_iterator(
            len,
            self.residuals
                .iter()
                .flat_map(|r| r.residual.iter().copied()),
        )
    }

    /// Half the sum of squared whitened residuals.
    pub fn cost(&self) -> f64 {
        0.5 * self
            .residuals
            .iter()
            .map(|r| r.residual.norm_squared())
            .sum::<f64>()
    }
}

#[derive(Debug, Clone)]
enum SampleStatus {
    Ready,
    Excluded(SampleFailure),
}

#[derive(Debug, Clone)]
struct SampleBlock {
    index: usize,
    sensors: Vec<Box<dyn SensorModel>>,
    status: SampleStatus,
}

/// Holds the sensors built for each sample and evaluates them against one
/// parameter snapshot at a time.
#[derive(Debug, Clone, Default)]
pub struct BatchEvaluator {
    blocks: Vec<SampleBlock>,
    /// Samples that could not even be turned into sensors.
    build_failures: Vec<SampleFailure>,
}

impl BatchEvaluator {
    /// Wraps pre-built sensors, one `Vec` per sample.
    pub fn new(sensors_per_sample: Vec<Vec<Box<dyn SensorModel>>>) -> Self {
        let blocks = sensors_per_sample
            .into_iter()
            .enumerate()
            .map(|(index, sensors)| SampleBlock {
                index,
                sensors,
                status: SampleStatus::Ready,
            })
            .collect();
        Self {
            blocks,
            build_failures: Vec::new(),
        }
    }

    /// Bundles every sample. Samples the bundler rejects are recorded and left out.
    pub fn from_samples(bundler: &CameraChainBundler, samples: &[CalibrationSample]) -> Self {
        let mut evaluator = Self::default();
        for (index, sample) in samples.iter().enumerate() {
            match bundler.build_blocks(sample) {
                Ok(sensors) => evaluator.blocks.push(SampleBlock {
                    index,
                    sensors: sensors
                        .into_iter()
                        .map(|s| Box::new(s) as Box<dyn SensorModel>)
                        .collect(),
                    status: SampleStatus::Ready,
                }),
                Err(error) => {
                    let failure = SampleFailure {
                        sample_index: index,
                        sensor_id: None,
                        error,
                    };
                    log_failure(&failure);
                    evaluator.build_failures.push(failure);
                }
            }
        }
        info!(
            "Bundled {} samples ({} rejected)",
            evaluator.blocks.len(),
            evaluator.build_failures.len()
        );
        evaluator
    }

    /// Loads every sample under the configured `samples_dir` and bundles it
    /// with the configured sensors.
    pub fn from_config(config: &EstimationConfig, capabilities: Capabilities) -> Result<Self> {
        let dir = config
            .samples_dir
            .as_deref()
            .ok_or(EstError::MissingSetting("samples_dir"))?;
        let samples = load_samples_from_dir(dir)?;
        let bundler = CameraChainBundler::new(config.sensors.clone(), capabilities);
        Ok(Self::from_samples(&bundler, &samples))
    }

    pub fn num_samples(&self) -> usize {
        self.blocks.len()
    }

    pub fn num_sensors(&self) -> usize {
        self.blocks.iter().map(|b| b.sensors.len()).sum()
    }

    pub fn build_failures(&self) -> &[SampleFailure] {
        &self.build_failures
    }

    /// Rebinds every sensor to `snapshot`.
    ///
    /// Must be called before each iteration's `evaluate`. A sample with any
    /// sensor that fails to bind is excluded until the next rebind.
    pub fn rebind_all(&mut self, snapshot: &ParameterSnapshot) -> Vec<SampleFailure> {
        let mut failures = Vec::new();
        for block in self.blocks.iter_mut() {
            block.status = SampleStatus::Ready;
            for sensor in block.sensors.iter_mut() {
                if let Err(error) = sensor.rebind(snapshot) {
                    let failure = SampleFailure {
                        sample_index: block.index,
                        sensor_id: Some(sensor.sensor_id().to_string()),
                        error,
                    };
                    log_failure(&failure);
                    failures.push(failure.clone());
                    block.status = SampleStatus::Excluded(failure);
                    break;
                }
            }
        }
        failures
    }

    /// Whitened residuals for every sample still in the iteration.
    pub fn evaluate(&self, target_pts: &[TargetPoint]) -> IterationReport {
        let mut report = IterationReport::default();

        for block in &self.blocks {
            if let SampleStatus::Excluded(failure) = &block.status {
                report.failures.push(failure.clone());
                continue;
            }
            match evaluate_block(block, target_pts) {
                Ok(residual) => report.residuals.push(SampleResidual {
                    sample_index: block.index,
                    residual,
                }),
                Err(failure) => {
                    log_failure(&failure);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            "Evaluated {} samples, excluded {}, cost {:.6}",
            report.residuals.len(),
            report.failures.len(),
            report.cost()
        );
        report
    }

    /// Union of every sensor's sparsity over all samples.
    pub fn sparsity_pattern(&self) -> SparsityMap {
        let mut pattern = SparsityMap::default();
        for sensor in self.blocks.iter().flat_map(|b| b.sensors.iter()) {
            pattern.merge(&sensor.sparsity());
        }
        pattern
    }

    /// The sparsity pattern as TOML, for handing to an external optimizer.
    pub fn sparsity_pattern_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.sparsity_pattern())?)
    }

    pub fn write_sparsity_pattern(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.sparsity_pattern_toml()?)?;
        info!("Wrote sparsity pattern to: {:?}", path);
        Ok(())
    }
}

fn evaluate_block(
    block: &SampleBlock,
    target_pts: &[TargetPoint],
) -> std::result::Result<DVector<f64>, SampleFailure> {
    let mut stacked = Vec::new();
    for sensor in &block.sensors {
        let r = sensor
            .residual_scaled(target_pts)
            .map_err(|error| SampleFailure {
                sample_index: block.index,
                sensor_id: Some(sensor.sensor_id().to_string()),
                error,
            })?;
        stacked.extend(r.iter().copied());
    }
    Ok(DVector::from_vec(stacked))
}

fn log_failure(failure: &SampleFailure) {
    warn!(
        sample = failure.sample_index,
        sensor = failure.sensor_id.as_deref().unwrap_or("-"),
        "excluding sample: {}",
        failure.error
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use camchain_core::prelude::*;
    use camchain_core::test_utils::{
        arm_snapshot, default_projection_matrix, planar_target, stub_capabilities,
    };
    use nalgebra::Point2;

    fn head_cam_reading(points: Vec<Pixel>) -> CameraReading {
        CameraReading {
            camera_id: "head_cam".into(),
            image_points: points,
            projection: default_projection_matrix(),
        }
    }

    fn arm_config() -> SensorConfigDescriptor {
        SensorConfigDescriptor {
            camera_id: "arm_cam".into(),
            sensor_id: None,
            chain: ChainDescriptor {
                before_chain: vec!["base_mount".into()],
                chain_id: Some("arm".into()),
                after_chain: vec![],
                dh_link_num: 2,
            },
        }
    }

    fn bundler() -> CameraChainBundler {
        CameraChainBundler::new(
            vec![SensorConfigDescriptor::camera_only("head_cam"), arm_config()],
            stub_capabilities(),
        )
    }

    fn samples() -> Vec<CalibrationSample> {
        let on_target = vec![Point2::new(320.0, 240.0), Point2::new(370.0, 240.0)];
        vec![
            // 0: head camera only, exactly on target.
            CalibrationSample {
                cameras: vec![head_cam_reading(on_target.clone())],
                chains: vec![],
            },
            // 1: arm camera without its chain reading.
            CalibrationSample {
                cameras: vec![CameraReading {
                    camera_id: "arm_cam".into(),
                    image_points: on_target.clone(),
                    projection: default_projection_matrix(),
                }],
                chains: vec![],
            },
            // 2: both cameras, head camera off by one pixel in u.
            CalibrationSample {
                cameras: vec![
                    head_cam_reading(vec![Point2::new(319.0, 240.0), Point2::new(369.0, 240.0)]),
                    CameraReading {
                        camera_id: "arm_cam".into(),
                        image_points: on_target,
                        projection: default_projection_matrix(),
                    },
                ],
                chains: vec![ChainReading {
                    chain_id: "arm".into(),
                    joint_positions: vec![0.0, 0.0],
                }],
            },
        ]
    }

    #[test]
    fn test_unknown_chain_excludes_only_that_sample() {
        let evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        assert_eq!(evaluator.num_samples(), 2);
        assert_eq!(evaluator.num_sensors(), 3);
        let failures = evaluator.build_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].sample_index, 1);
        assert!(matches!(
            failures[0].error,
            CalibError::UnknownChainReference { .. }
        ));
    }

    #[test]
    fn test_evaluate_stacks_whitened_residuals() {
        let mut evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        assert!(evaluator.rebind_all(&arm_snapshot(2)).is_empty());

        let target = planar_target(2, 1, 0.1, 1.0);
        let report = evaluator.evaluate(&target);
        assert!(report.failures.is_empty());
        assert_eq!(report.residuals.len(), 2);
        assert_eq!(report.residuals[0].sample_index, 0);
        assert_eq!(report.residuals[1].sample_index, 2);
        assert_eq!(report.stacked().len(), 4 + 8);

        // Sample 2's head camera sees every point 1 px left of prediction;
        // with 0.5 px noise that whitens to 2.
        let r = &report.residuals[1].residual;
        assert_abs_diff_eq!(r[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r[2], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r[1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.cost(), 0.5 * 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_parameter_excludes_sample_until_next_rebind() {
        let mut evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        let mut snapshot = arm_snapshot(2);
        snapshot.transforms.remove("base_mount");

        let failures = evaluator.rebind_all(&snapshot);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].sample_index, 2);
        assert_eq!(failures[0].sensor_id.as_deref(), Some("arm_cam"));

        let target = planar_target(2, 1, 0.1, 1.0);
        let report = evaluator.evaluate(&target);
        assert_eq!(report.residuals.len(), 1);
        assert_eq!(report.failures.len(), 1);

        assert!(evaluator.rebind_all(&arm_snapshot(2)).is_empty());
        assert_eq!(evaluator.evaluate(&target).residuals.len(), 2);
    }

    #[test]
    fn test_evaluation_error_excludes_sample() {
        let mut evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        evaluator.rebind_all(&arm_snapshot(2));

        // Three target points against two detections.
        let report = evaluator.evaluate(&planar_target(3, 1, 0.1, 1.0));
        assert!(report.residuals.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, CalibError::DimensionMismatch { expected: 2, found: 3 })));
    }

    #[test]
    fn test_unbound_evaluator_reports_not_bound() {
        let evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        let report = evaluator.evaluate(&planar_target(2, 1, 0.1, 1.0));
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, CalibError::NotBound { .. })));
    }

    #[test]
    fn test_sparsity_pattern_covers_all_samples() {
        let evaluator = BatchEvaluator::from_samples(&bundler(), &samples());
        let pattern = evaluator.sparsity_pattern();
        assert_eq!(pattern.rectified_cams.len(), 2);
        assert_eq!(pattern.dh_chains["arm"].dh.len(), 2);
        assert_eq!(pattern.transforms.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparsity.toml");
        evaluator.write_sparsity_pattern(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("base_mount"));
        assert!(text.contains("f_shift"));
    }

    #[test]
    fn test_new_wraps_prebuilt_sensors() {
        let sensor = CameraChainSensor::new(
            SensorConfigDescriptor::camera_only("head_cam"),
            head_cam_reading(vec![Point2::new(320.0, 240.0)]),
            None,
            stub_capabilities(),
        )
        .unwrap();
        let boxed: Box<dyn SensorModel> = Box::new(sensor);
        let mut evaluator = BatchEvaluator::new(vec![Vec::new(), vec![boxed]]);
        assert_eq!(evaluator.num_samples(), 2);
        assert!(evaluator.build_failures().is_empty());

        evaluator.rebind_all(&arm_snapshot(1));
        let report = evaluator.evaluate(&planar_target(1, 1, 0.1, 1.0));
        assert_eq!(report.residuals.len(), 2);
        assert_eq!(report.residuals[0].residual.len(), 0);
        assert_eq!(report.residuals[1].sample_index, 1);
        assert_eq!(report.stacked(), DVector::zeros(2));
    }

    #[test]
    fn test_from_config_loads_samples_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("000.toml"),
            r#"
            [[cameras]]
            camera_id = "head_cam"
            image_points = [[320.0, 240.0], [370.0, 240.0]]
            projection = [[500.0, 0.0, 320.0, 0.0], [0.0, 500.0, 240.0, 0.0], [0.0, 0.0, 1.0, 0.0]]
            "#,
        )
        .unwrap();
        let config = EstimationConfig {
            sensors: vec![SensorConfigDescriptor::camera_only("head_cam")],
            samples_dir: Some(dir.path().to_path_buf()),
            snapshot_file: None,
        };

        let mut evaluator = BatchEvaluator::from_config(&config, stub_capabilities()).unwrap();
        assert_eq!(evaluator.num_sensors(), 1);
        evaluator.rebind_all(&arm_snapshot(1));
        let report = evaluator.evaluate(&planar_target(2, 1, 0.1, 1.0));
        assert_abs_diff_eq!(report.cost(), 0.0, epsilon = 1e-12);

        let unset = EstimationConfig::default();
        assert!(matches!(
            BatchEvaluator::from_config(&unset, stub_capabilities()),
            Err(EstError::MissingSetting("samples_dir"))
        ));
    }
}
