// ─────────────────────────────────────────────────────────────────────
// CR Waves — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{CrwError, CrwResult};
use crate::units::{
    CM2_PER_S, ERG, GEV_C, KPC, KYR, MICROGAUSS, PARSEC, PER_CM3, SECOND, YEAR,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level run configuration.
/// Every field has a default matching the reference halo run, so an empty
/// JSON object `{}` is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Run tag, used as the prefix of every dump file.
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub plasma: PlasmaConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub flags: SolverFlags,
}

/// Slab (1D) or spherical halo (3D) discretization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryMode {
    #[default]
    Planar,
    Spherical,
}

/// Nonlinear damping law of the self-generated waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DampingRegime {
    /// Γ ∝ k^1.5 √W
    #[default]
    Kolmogorov,
    /// Classical turbulent damping, Γ ∝ k² W
    Kraichnan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Lowest momentum [GeV/c]
    #[serde(default = "default_p_min_gev")]
    pub p_min_gev: f64,
    /// Highest momentum [GeV/c]
    #[serde(default = "default_p_max_gev")]
    pub p_max_gev: f64,
    #[serde(default = "default_p_size")]
    pub p_size: usize,
    #[serde(default = "default_z_size")]
    pub z_size: usize,
    /// Half-height of the slab, or outer radius of the sphere [kpc]
    #[serde(default = "default_halo_size_kpc")]
    pub halo_size_kpc: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlasmaConfig {
    /// Regular magnetic field [μG]
    #[serde(default = "default_magnetic_field_mug")]
    pub magnetic_field_mug: f64,
    /// Ion density [cm⁻³]
    #[serde(default = "default_ion_density_cm3")]
    pub ion_density_cm3: f64,
    /// Neutral hydrogen density [cm⁻³], drives ionization losses
    #[serde(default = "default_neutral_density_cm3")]
    pub neutral_density_cm3: f64,
    /// Background turbulence level η_B = δB²/B²
    #[serde(default = "default_turbulence_level")]
    pub turbulence_level: f64,
    /// Injection scale of the background turbulence [pc]
    #[serde(default = "default_coherence_length_pc")]
    pub coherence_length_pc: f64,
    /// Dimensionless nonlinear damping constant c_K
    #[serde(default = "default_damping_constant")]
    pub damping_constant: f64,
    /// Ceiling for D_zz where the wave field vanishes [cm²/s]
    #[serde(default = "default_d_zz_max_cm2s")]
    pub d_zz_max_cm2s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// CR luminosity [erg/s]
    #[serde(default = "default_luminosity_erg_s")]
    pub luminosity_erg_s: f64,
    /// Injection slope α, Q ∝ p^-α
    #[serde(default = "default_slope")]
    pub slope: f64,
    /// Gaussian width of the source [pc]
    #[serde(default = "default_source_size_pc")]
    pub size_pc: f64,
    /// Source decay timescale t₀ [kyr]
    #[serde(default = "default_decay_time_kyr")]
    pub decay_time_kyr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Time step [yr]
    #[serde(default = "default_dt_yr")]
    pub dt_yr: f64,
    /// Total step budget
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Steps between dumps
    #[serde(default = "default_dump_interval")]
    pub dump_interval: usize,
    /// Steps before self-generation engages
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: usize,
    /// Directory receiving dumps
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverFlags {
    #[serde(default)]
    pub geometry: GeometryMode,
    #[serde(default)]
    pub damping: DampingRegime,
    #[serde(default = "default_true")]
    pub do_selfgeneration: bool,
    /// Run the momentum-loss operator every step
    #[serde(default)]
    pub do_momentum_losses: bool,
    /// Include the adiabatic (∂v_A/∂z) term in the momentum operator
    #[serde(default)]
    pub adiabatic_momentum_term: bool,
    /// Cap W_sg at 1/k after each wave update
    #[serde(default)]
    pub wave_ceiling: bool,
}

fn default_tag() -> String {
    "testN0.1pc_3.5_kol_3.8e33".to_string()
}
fn default_p_min_gev() -> f64 {
    1.0
}
fn default_p_max_gev() -> f64 {
    1e4
}
fn default_p_size() -> usize {
    32 * 4
}
fn default_z_size() -> usize {
    401
}
fn default_halo_size_kpc() -> f64 {
    0.1
}
fn default_magnetic_field_mug() -> f64 {
    1.0
}
fn default_ion_density_cm3() -> f64 {
    0.1
}
fn default_neutral_density_cm3() -> f64 {
    0.1
}
fn default_turbulence_level() -> f64 {
    0.05
}
fn default_coherence_length_pc() -> f64 {
    50.0
}
fn default_damping_constant() -> f64 {
    0.052
}
fn default_d_zz_max_cm2s() -> f64 {
    1e31
}
fn default_luminosity_erg_s() -> f64 {
    3.8e33
}
fn default_slope() -> f64 {
    3.5
}
fn default_source_size_pc() -> f64 {
    1.0
}
fn default_decay_time_kyr() -> f64 {
    10.0
}
fn default_dt_yr() -> f64 {
    0.1
}
fn default_max_steps() -> usize {
    1000 * 10_000
}
fn default_dump_interval() -> usize {
    10_000
}
fn default_warmup_steps() -> usize {
    10_000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_true() -> bool {
    true
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            p_min_gev: default_p_min_gev(),
            p_max_gev: default_p_max_gev(),
            p_size: default_p_size(),
            z_size: default_z_size(),
            halo_size_kpc: default_halo_size_kpc(),
        }
    }
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        PlasmaConfig {
            magnetic_field_mug: default_magnetic_field_mug(),
            ion_density_cm3: default_ion_density_cm3(),
            neutral_density_cm3: default_neutral_density_cm3(),
            turbulence_level: default_turbulence_level(),
            coherence_length_pc: default_coherence_length_pc(),
            damping_constant: default_damping_constant(),
            d_zz_max_cm2s: default_d_zz_max_cm2s(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            luminosity_erg_s: default_luminosity_erg_s(),
            slope: default_slope(),
            size_pc: default_source_size_pc(),
            decay_time_kyr: default_decay_time_kyr(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dt_yr: default_dt_yr(),
            max_steps: default_max_steps(),
            dump_interval: default_dump_interval(),
            warmup_steps: default_warmup_steps(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for SolverFlags {
    fn default() -> Self {
        SolverFlags {
            geometry: GeometryMode::default(),
            damping: DampingRegime::default(),
            do_selfgeneration: true,
            do_momentum_losses: false,
            adiabatic_momentum_term: false,
            wave_ceiling: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tag: default_tag(),
            grid: GridConfig::default(),
            plasma: PlasmaConfig::default(),
            source: SourceConfig::default(),
            run: RunConfig::default(),
            flags: SolverFlags::default(),
        }
    }
}

impl GridConfig {
    pub fn p_min(&self) -> f64 {
        self.p_min_gev * GEV_C
    }
    pub fn p_max(&self) -> f64 {
        self.p_max_gev * GEV_C
    }
    pub fn halo_size(&self) -> f64 {
        self.halo_size_kpc * KPC
    }
}

impl PlasmaConfig {
    pub fn magnetic_field(&self) -> f64 {
        self.magnetic_field_mug * MICROGAUSS
    }
    pub fn ion_density(&self) -> f64 {
        self.ion_density_cm3 * PER_CM3
    }
    pub fn neutral_density(&self) -> f64 {
        self.neutral_density_cm3 * PER_CM3
    }
    pub fn coherence_length(&self) -> f64 {
        self.coherence_length_pc * PARSEC
    }
    pub fn d_zz_max(&self) -> f64 {
        self.d_zz_max_cm2s * CM2_PER_S
    }
}

impl SourceConfig {
    pub fn luminosity(&self) -> f64 {
        self.luminosity_erg_s * ERG / SECOND
    }
    pub fn size(&self) -> f64 {
        self.size_pc * PARSEC
    }
    pub fn decay_time(&self) -> f64 {
        self.decay_time_kyr * KYR
    }
}

impl RunConfig {
    pub fn dt(&self) -> f64 {
        self.dt_yr * YEAR
    }
}

fn require_positive(name: &str, value: f64) -> CrwResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CrwError::ConfigError(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(name: &str, value: f64) -> CrwResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CrwError::ConfigError(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

impl SimulationConfig {
    /// Load from a JSON file and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CrwResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON of the effective configuration, defaults filled in.
    pub fn to_json_pretty(&self) -> CrwResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot evolve.
    pub fn validate(&self) -> CrwResult<()> {
        let g = &self.grid;
        require_positive("grid.p_min_gev", g.p_min_gev)?;
        require_positive("grid.p_max_gev", g.p_max_gev)?;
        if g.p_max_gev <= g.p_min_gev {
            return Err(CrwError::ConfigError(format!(
                "grid.p_max_gev ({}) must exceed grid.p_min_gev ({})",
                g.p_max_gev, g.p_min_gev
            )));
        }
        if g.p_size < 3 {
            return Err(CrwError::ConfigError(format!(
                "grid.p_size must be >= 3, got {}",
                g.p_size
            )));
        }
        if g.z_size < 5 {
            return Err(CrwError::ConfigError(format!(
                "grid.z_size must be >= 5, got {}",
                g.z_size
            )));
        }
        require_positive("grid.halo_size_kpc", g.halo_size_kpc)?;

        let pl = &self.plasma;
        require_positive("plasma.magnetic_field_mug", pl.magnetic_field_mug)?;
        require_positive("plasma.ion_density_cm3", pl.ion_density_cm3)?;
        require_non_negative("plasma.neutral_density_cm3", pl.neutral_density_cm3)?;
        require_positive("plasma.turbulence_level", pl.turbulence_level)?;
        require_positive("plasma.coherence_length_pc", pl.coherence_length_pc)?;
        require_positive("plasma.damping_constant", pl.damping_constant)?;
        require_positive("plasma.d_zz_max_cm2s", pl.d_zz_max_cm2s)?;

        let s = &self.source;
        require_non_negative("source.luminosity_erg_s", s.luminosity_erg_s)?;
        require_positive("source.slope", s.slope)?;
        require_positive("source.size_pc", s.size_pc)?;
        require_positive("source.decay_time_kyr", s.decay_time_kyr)?;

        let r = &self.run;
        require_positive("run.dt_yr", r.dt_yr)?;
        if r.dump_interval == 0 {
            return Err(CrwError::ConfigError(
                "run.dump_interval must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
