use crate::model::table::{TableRecord, Value};
use serde::{Deserialize, Serialize};

/// One observing mode summarised for the `Scenarios` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_name: String,
    pub minangsep_lam_d: f64,
    pub maxangsep_lam_d: f64,
    pub minangsep_as: f64,
    pub maxangsep_as: f64,
    /// Central wavelength in nm.
    pub lam: f64,
    /// Bandwidth as a fraction of `lam`.
    pub bandpass: f64,
    /// Bandwidth in nm.
    pub delta_lam: f64,
    /// Size of one λ/D in arcseconds.
    pub lam_d_as: f64,
}

impl TableRecord for Scenario {
    const COLUMNS: &'static [&'static str] = &[
        "scenario_name",
        "minangsep_lamD",
        "maxangsep_lamD",
        "minangsep_as",
        "maxangsep_as",
        "lam",
        "bandpass",
        "delta_lam",
        "lamD_as",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.scenario_name.clone()),
            self.minangsep_lam_d.into(),
            self.maxangsep_lam_d.into(),
            self.minangsep_as.into(),
            self.maxangsep_as.into(),
            self.lam.into(),
            self.bandpass.into(),
            self.delta_lam.into(),
            self.lam_d_as.into(),
        ]
    }
}

/// One sampled working angle of a mode's saturation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationCurvePoint {
    pub scenario_name: String,
    pub r_lam_d: f64,
    pub r_as: f64,
    /// `10^(-0.4 * d_mag)`
    pub contrast: f64,
    pub d_mag: f64,
    /// Hours needed to reach 99% of the saturation magnitude.
    pub t_int_hr_99percent: f64,
}

impl TableRecord for SaturationCurvePoint {
    const COLUMNS: &'static [&'static str] = &[
        "scenario_name",
        "r_lamD",
        "r_as",
        "contrast",
        "dMag",
        "t_int_hr_99percent_V5",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.scenario_name.clone()),
            self.r_lam_d.into(),
            self.r_as.into(),
            self.contrast.into(),
            self.d_mag.into(),
            self.t_int_hr_99percent.into(),
        ]
    }
}
