// ─────────────────────────────────────────────────────────────────────
// CR Waves — Evolution Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time stepper: applies the operator schedule step by step, with
//! periodic diagnostics and dumps.
//!
//! Configuring → Stepping → Terminal. A solver failure aborts the run in
//! the step it occurs; no NaN ever reaches the state.

use crate::diagnostics::{
    test_boundary_conditions, test_courant_conditions, test_total_energy, CourantNumbers,
    EnergyBalance, FieldRange,
};
use crate::dump::{Snapshot, SnapshotSink};
use crate::geometry::Geometry;
use crate::setup::build_fields;
use crate::splitting::{OperatorSchedule, StepContext, TimeStep};
use crate::waves::WaveSolver;
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::CrFields;
use crwaves_types::units::{CM2_PER_S, KYR};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuring,
    Stepping,
    Terminal,
}

/// Field ranges printed at every dump point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub step: usize,
    /// Simulated time [s]
    pub t: f64,
    pub f_cr: FieldRange,
    pub df_dz: FieldRange,
    pub d_zz: FieldRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    /// Simulated time [s]
    pub simulated_time: f64,
    pub dumps: usize,
    pub courant: CourantNumbers,
    pub final_status: StatusReport,
    pub energy: EnergyBalance,
    pub boundary_leak: f64,
}

#[derive(Debug)]
pub struct Evolver {
    config: SimulationConfig,
    fields: CrFields,
    geometry: Geometry,
    schedule: OperatorSchedule,
    time: TimeStep,
    phase: Phase,
    counter: usize,
}

impl Evolver {
    /// Take ownership of prepared fields. Shapes and configuration are
    /// checked here, before any evolution.
    pub fn new(config: SimulationConfig, fields: CrFields) -> CrwResult<Self> {
        config.validate()?;
        fields.check_shapes()?;
        let (p_size, z_size) = fields.shape();
        if p_size < 3 || z_size < 5 {
            return Err(CrwError::ConfigError(format!(
                "grid {p_size}x{z_size} is too small for the interior solves"
            )));
        }
        let geometry = Geometry::from(config.flags.geometry);
        let schedule = OperatorSchedule::from_config(&config);
        let time = TimeStep::new(config.run.dt())?;
        Ok(Evolver {
            config,
            fields,
            geometry,
            schedule,
            time,
            phase: Phase::Configuring,
            counter: 0,
        })
    }

    /// Build every field from the configuration.
    pub fn from_config(config: SimulationConfig) -> CrwResult<Self> {
        let fields = build_fields(&config)?;
        Self::new(config, fields)
    }

    /// Replace the configured operator list. Energy and boundary
    /// diagnostics follow the geometry of the new spatial transport.
    pub fn with_schedule(mut self, schedule: OperatorSchedule) -> Self {
        if let Some(geometry) = schedule.geometry() {
            self.geometry = geometry;
        }
        self.schedule = schedule;
        self
    }

    pub fn set_dt(&mut self, dt: f64) -> CrwResult<()> {
        self.time = TimeStep::new(dt)?;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn time_step(&self) -> TimeStep {
        self.time
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn fields(&self) -> &CrFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut CrFields {
        &mut self.fields
    }

    pub fn schedule(&self) -> &OperatorSchedule {
        &self.schedule
    }

    /// Advance one step: every active operator at t = counter · dt.
    pub fn step(&mut self) -> CrwResult<()> {
        self.counter += 1;
        let ctx = StepContext {
            step: self.counter,
            t_now: self.counter as f64 * self.time.dt(),
            time: self.time,
            source_decay_time: self.config.source.decay_time(),
            n_transport_ops: self.schedule.transport_count(),
        };
        self.schedule.apply_step(&mut self.fields, &ctx)?;
        Ok(())
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            step: self.counter,
            t: self.counter as f64 * self.time.dt(),
            f_cr: FieldRange::of(&self.fields.f_cr),
            df_dz: FieldRange::of(&self.fields.df_dz),
            d_zz: FieldRange::of(&self.fields.d_zz),
        }
    }

    fn print_status(&self, start: Instant) -> StatusReport {
        let status = self.status();
        log::info!(
            "dump at {:.3} kyr after {} secs",
            status.t / KYR,
            start.elapsed().as_secs()
        );
        log::info!(" - f in {:.4e} ... {:.4e}", status.f_cr.min, status.f_cr.max);
        log::info!(" - dfdz in {:.4e} ... {:.4e}", status.df_dz.min, status.df_dz.max);
        log::info!(
            " - D in {:.4e} ... {:.4e} cm2/s",
            status.d_zz.min / CM2_PER_S,
            status.d_zz.max / CM2_PER_S
        );
        status
    }

    fn energy_balance(&self) -> EnergyBalance {
        let t = self.counter as f64 * self.time.dt();
        test_total_energy(
            &self.fields,
            &self.geometry,
            t,
            self.config.source.decay_time(),
        )
    }

    /// Run the configured step budget, dumping every `dump_interval` steps.
    pub fn evolve(&mut self, sink: &mut dyn SnapshotSink) -> CrwResult<RunSummary> {
        if self.phase != Phase::Configuring {
            return Err(CrwError::ConfigError(format!(
                "evolve called in phase {:?}",
                self.phase
            )));
        }
        let max_steps = self.config.run.max_steps;
        let dump_interval = self.config.run.dump_interval;
        let dt = self.time.dt();
        log::info!(
            "running for {:.3} kyr with dt = {:.3e} kyr ({} steps, operators: {:?}, {} threads)",
            max_steps as f64 * dt / KYR,
            dt / KYR,
            max_steps,
            self.schedule.names(),
            rayon::current_num_threads()
        );
        let courant = test_courant_conditions(&self.fields, &WaveSolver::from_config(&self.config), dt);

        self.phase = Phase::Stepping;
        let start = Instant::now();
        let mut dumps = 0usize;
        while self.counter < max_steps {
            if let Err(err) = self.step() {
                self.phase = Phase::Terminal;
                log::error!("run aborted at step {}: {err}", self.counter);
                return Err(err);
            }
            if self.counter % dump_interval == 0 {
                self.print_status(start);
                self.energy_balance();
                test_boundary_conditions(&self.fields, &self.geometry);
                let snapshot = Snapshot {
                    step: self.counter,
                    t: self.counter as f64 * dt,
                    fields: &self.fields,
                };
                if let Err(err) = sink.write(&snapshot) {
                    self.phase = Phase::Terminal;
                    log::error!("dump failed at step {}: {err}", self.counter);
                    return Err(err);
                }
                dumps += 1;
            }
        }

        self.phase = Phase::Terminal;
        let final_status = self.print_status(start);
        let energy = self.energy_balance();
        let boundary_leak = test_boundary_conditions(&self.fields, &self.geometry);
        Ok(RunSummary {
            steps: self.counter,
            simulated_time: self.counter as f64 * dt,
            dumps,
            courant,
            final_status,
            energy,
            boundary_leak,
        })
    }
}
