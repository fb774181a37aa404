//! Scenario and saturation-curve tables computed from a coronagraph
//! simulation.
//!
//! The simulation itself is behind [`SimulationEngine`]. This module only
//! walks its observing modes, samples working angles and assembles rows.
//! Modes are evaluated in parallel; output rows keep the engine's mode order.

use crate::config::Settings;
use crate::error::SimulationError;
use crate::units::{contrast_from_dmag, Angle, Background, PhotonFlux, SpectralRadiance, Time, Wavelength};
use common::model::scenario::{SaturationCurvePoint, Scenario};
use common::model::table::Table;
use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Working angles sampled per mode unless the caller says otherwise.
pub const DEFAULT_POINTS_PER_MODE: usize = 100;

/// Fraction of the saturation magnitude the integration time is computed for.
pub const SATURATION_FRACTION: f64 = 0.99;

/// One configured observing mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObservingMode {
    /// Scenario name, unique per mode.
    pub scenario: String,
    /// Inner working angle.
    pub iwa: Angle,
    /// Outer working angle.
    pub owa: Angle,
    /// Central wavelength.
    pub lam: Wavelength,
    /// Bandwidth as a fraction of `lam`.
    pub bandwidth: f64,
    pub delta_lam: Wavelength,
    /// Zero-magnitude photon flux over the band.
    pub f0: PhotonFlux,
    /// The instrument's native angle unit, λ/D at `lam`.
    pub lam_d: Angle,
}

/// The external simulation.
///
/// Implementations must be callable from several threads at once; the
/// generator evaluates modes in parallel.
pub trait SimulationEngine: Sync {
    fn observing_modes(&self) -> &[ObservingMode];

    /// Local zodiacal light for `mode`, colour-corrected to its wavelength.
    fn zodi_radiance(&self, mode: &ObservingMode) -> Result<SpectralRadiance, SimulationError>;

    /// Saturation Δmag at `angle`.
    fn saturation_magnitude(
        &self,
        mode: &ObservingMode,
        angle: Angle,
        background: Background,
    ) -> Result<f64, SimulationError>;

    /// Integration time needed to reach `magnitude` at `angle`.
    fn integration_time(
        &self,
        mode: &ObservingMode,
        angle: Angle,
        magnitude: f64,
        background: Background,
    ) -> Result<Time, SimulationError>;
}

/// Engines built from a JSON configuration document.
pub trait FromConfig: Sized {
    fn from_config(config: &serde_json::Value) -> Result<Self, SimulationError>;
}

/// `<data_dir>/scripts/CGI_Noise.json`
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("scripts").join("CGI_Noise.json")
}

pub fn load_config(path: &Path) -> Result<serde_json::Value, SimulationError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SimulationError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| SimulationError::Config(format!("{}: {}", path.display(), e)))
}

/// Builds an engine from the configuration file at `path`.
pub fn engine_from_file<E: FromConfig>(path: &Path) -> Result<E, SimulationError> {
    let config = load_config(path)?;
    debug!("Loaded simulation configuration from {}", path.display());
    E::from_config(&config)
}

/// Builds an engine from `CGI_Noise.json` under the configured simulation
/// data directory.
pub fn engine_from_settings<E: FromConfig>(settings: &Settings) -> Result<E, SimulationError> {
    let data_dir = settings
        .simulation_data_dir
        .as_deref()
        .ok_or_else(|| SimulationError::Config("CORGIETC_DATA_DIR is not set".to_string()))?;
    engine_from_file(&config_path(data_dir))
}

/// `n` evenly spaced angles from `start` to `stop`, both ends exact.
pub fn linspace(start: Angle, stop: Angle, n: usize) -> Vec<Angle> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (a, b) = (start.arcsec(), stop.arcsec());
            let step = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        stop
                    } else {
                        Angle::from_arcsec(a + step * i as f64)
                    }
                })
                .collect()
        }
    }
}

pub fn scenario_for_mode(mode: &ObservingMode) -> Scenario {
    Scenario {
        scenario_name: mode.scenario.clone(),
        minangsep_lam_d: mode.iwa / mode.lam_d,
        maxangsep_lam_d: mode.owa / mode.lam_d,
        minangsep_as: mode.iwa.arcsec(),
        maxangsep_as: mode.owa.arcsec(),
        lam: mode.lam.nm(),
        bandpass: mode.bandwidth,
        delta_lam: mode.delta_lam.nm(),
        lam_d_as: mode.lam_d.arcsec(),
    }
}

pub fn scenarios<E: SimulationEngine + ?Sized>(engine: &E) -> Vec<Scenario> {
    engine.observing_modes().iter().map(scenario_for_mode).collect()
}

/// The `Scenarios` table: one row per observing mode.
pub fn generate_scenarios<E: SimulationEngine + ?Sized>(engine: &E) -> Table {
    let rows = scenarios(engine);
    info!("Generated {} scenario row(s)", rows.len());
    Table::from_records(&rows)
}

/// The background a mode sees, relative to its zero point.
pub fn mode_background<E: SimulationEngine + ?Sized>(
    engine: &E,
    mode: &ObservingMode,
) -> Result<Background, SimulationError> {
    let radiance = engine.zodi_radiance(mode)?;
    Ok(Background::relative_to_zero_point(
        radiance, mode.lam, mode.f0, mode.delta_lam,
    ))
}

/// Saturation curve for one mode over `points` working angles.
pub fn curve_for_mode<E: SimulationEngine + ?Sized>(
    engine: &E,
    mode: &ObservingMode,
    points: usize,
) -> Result<Vec<SaturationCurvePoint>, SimulationError> {
    let background = mode_background(engine, mode)?;
    debug!("{}: fZ = {:e} arcsec^-2", mode.scenario, background.value());

    linspace(mode.iwa, mode.owa, points)
        .into_iter()
        .map(|angle| {
            let d_mag = engine.saturation_magnitude(mode, angle, background)?;
            let t_int = engine.integration_time(mode, angle, d_mag * SATURATION_FRACTION, background)?;
            Ok(SaturationCurvePoint {
                scenario_name: mode.scenario.clone(),
                r_lam_d: angle / mode.lam_d,
                r_as: angle.arcsec(),
                contrast: contrast_from_dmag(d_mag),
                d_mag,
                t_int_hr_99percent: t_int.hours(),
            })
        })
        .collect()
}

pub fn saturation_curves<E: SimulationEngine + ?Sized>(
    engine: &E,
    points_per_mode: usize,
) -> Result<Vec<SaturationCurvePoint>, SimulationError> {
    let per_mode: Vec<Vec<SaturationCurvePoint>> = engine
        .observing_modes()
        .par_iter()
        .map(|mode| curve_for_mode(engine, mode, points_per_mode))
        .collect::<Result<_, _>>()?;
    Ok(per_mode.into_iter().flatten().collect())
}

/// The `SaturationCurves` table: `points_per_mode` rows per observing mode.
pub fn generate_saturation_curves<E: SimulationEngine + ?Sized>(
    engine: &E,
    points_per_mode: usize,
) -> Result<Table, SimulationError> {
    let rows = saturation_curves(engine, points_per_mode)?;
    info!("Generated {} saturation curve row(s)", rows.len());
    Ok(Table::from_records(&rows))
}
