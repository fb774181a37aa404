//! Unit-tagged quantities used by the curve generator.
//!
//! Each type stores one canonical unit and only converts at its edges, so a
//! value cannot be read in the wrong unit by accident.

use serde::{Deserialize, Serialize};
use std::ops::Div;

/// Planck constant, erg s.
pub const PLANCK_ERG_S: f64 = 6.626_070_15e-27;
/// Speed of light, cm/s.
pub const SPEED_OF_LIGHT_CM_S: f64 = 2.997_924_58e10;
/// Square arcseconds in one steradian.
pub const ARCSEC2_PER_SR: f64 = 4.254_517_029_615_22e10;

const MAS_PER_ARCSEC: f64 = 1_000.0;
const CM_PER_NM: f64 = 1e-7;
const ANGSTROM_PER_NM: f64 = 10.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// An on-sky angle, stored in arcseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    pub fn from_arcsec(arcsec: f64) -> Self {
        Self(arcsec)
    }

    pub fn from_mas(mas: f64) -> Self {
        Self(mas / MAS_PER_ARCSEC)
    }

    pub fn arcsec(self) -> f64 {
        self.0
    }
}

/// Ratio of two angles, e.g. an angle in units of λ/D.
impl Div for Angle {
    type Output = f64;

    fn div(self, rhs: Angle) -> f64 {
        self.0 / rhs.0
    }
}

/// Stored in nanometres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wavelength(f64);

impl Wavelength {
    pub fn from_nm(nm: f64) -> Self {
        Self(nm)
    }

    pub fn nm(self) -> f64 {
        self.0
    }

    pub fn cm(self) -> f64 {
        self.0 * CM_PER_NM
    }

    /// Energy of one photon at this wavelength, in erg.
    pub fn photon_energy_erg(self) -> f64 {
        PLANCK_ERG_S * SPEED_OF_LIGHT_CM_S / self.cm()
    }
}

/// Photon flux, ph s⁻¹ cm⁻².
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotonFlux(f64);

impl PhotonFlux {
    pub fn new(ph_s_cm2: f64) -> Self {
        Self(ph_s_cm2)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Flux per nanometre of bandwidth, ph s⁻¹ cm⁻² nm⁻¹.
    pub fn per_nm(self, bandwidth: Wavelength) -> f64 {
        self.0 / bandwidth.nm()
    }
}

/// Spectral radiance in FLAM per steradian (erg s⁻¹ cm⁻² Å⁻¹ sr⁻¹).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpectralRadiance(f64);

impl SpectralRadiance {
    pub fn from_flam_per_sr(value: f64) -> Self {
        Self(value)
    }

    /// Photon radiance at `lam`, in ph s⁻¹ cm⁻² nm⁻¹ arcsec⁻².
    pub fn photon_radiance(self, lam: Wavelength) -> f64 {
        let photlam_per_sr = self.0 / lam.photon_energy_erg();
        photlam_per_sr * ANGSTROM_PER_NM / ARCSEC2_PER_SR
    }
}

/// Background surface brightness relative to a mode's zero point, arcsec⁻².
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Background(f64);

impl Background {
    pub fn value(self) -> f64 {
        self.0
    }

    /// `fZ`: photon radiance at `lam` over the zero-point flux per nm.
    pub fn relative_to_zero_point(
        radiance: SpectralRadiance,
        lam: Wavelength,
        zero_point: PhotonFlux,
        bandwidth: Wavelength,
    ) -> Self {
        Self(radiance.photon_radiance(lam) / zero_point.per_nm(bandwidth))
    }
}

/// A duration, stored in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(f64);

impl Time {
    pub fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn from_days(days: f64) -> Self {
        Self(days * SECONDS_PER_DAY)
    }

    pub fn hours(self) -> f64 {
        self.0 / SECONDS_PER_HOUR
    }
}

/// Flux ratio of a magnitude difference: `10^(-0.4 * dmag)`.
pub fn contrast_from_dmag(dmag: f64) -> f64 {
    10f64.powf(-0.4 * dmag)
}
