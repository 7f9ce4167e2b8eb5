// ─────────────────────────────────────────────────────────────────────
// CR Waves — Operator Splitting
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered list of split operators applied once per time step.

use crate::diffusion::DiffusionModel;
use crate::geometry::Geometry;
use crate::momentum::MomentumTransport;
use crate::physics::source_evolution;
use crate::spatial::SpatialTransport;
use crate::waves::WaveSolver;
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::CrFields;
use std::fmt::Debug;

/// Step size and its Crank–Nicolson half. The half is only ever set
/// together with the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    dt: f64,
    dt_half: f64,
}

impl TimeStep {
    pub fn new(dt: f64) -> CrwResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(CrwError::ConfigError(format!(
                "time step must be finite and > 0, got {dt}"
            )));
        }
        Ok(TimeStep {
            dt,
            dt_half: 0.5 * dt,
        })
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[inline]
    pub fn dt_half(&self) -> f64 {
        self.dt_half
    }
}

/// Everything an operator needs to know about the current step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// 1-based step counter
    pub step: usize,
    /// Simulated time at which the source is evaluated
    pub t_now: f64,
    pub time: TimeStep,
    /// Source decay timescale t₀
    pub source_decay_time: f64,
    /// Number of source-injecting operators sharing this step
    pub n_transport_ops: usize,
}

impl StepContext {
    /// Source factor applied to `Q_cr` by one transport operator.
    pub fn source_weight(&self) -> f64 {
        source_evolution(self.t_now, self.source_decay_time) / self.n_transport_ops.max(1) as f64
    }
}

/// One term of the split evolution equation.
pub trait Operator: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this operator injects a share of the CR source.
    fn injects_source(&self) -> bool {
        false
    }

    /// Height discretization the operator transports on, if any.
    fn geometry(&self) -> Option<Geometry> {
        None
    }

    /// Whether the operator runs at this step.
    fn is_active(&self, _ctx: &StepContext) -> bool {
        true
    }

    fn apply(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<()>;
}

/// Wave feedback cycle: gradient, wave update, then diffusion rebuild.
#[derive(Debug, Clone)]
pub struct SelfGeneration {
    pub waves: WaveSolver,
    pub diffusion: DiffusionModel,
    /// Steps that must elapse before the cycle engages
    pub warmup_steps: usize,
}

impl Operator for SelfGeneration {
    fn name(&self) -> &'static str {
        "self_generation"
    }

    fn is_active(&self, ctx: &StepContext) -> bool {
        ctx.step > self.warmup_steps
    }

    fn apply(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<()> {
        self.diffusion.compute_dfdz(fields);
        self.waves.evolve(fields, ctx)?;
        self.diffusion.compute_d_zz(fields);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct OperatorSchedule {
    operators: Vec<Box<dyn Operator>>,
}

impl OperatorSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spatial transport, then momentum losses and wave feedback as enabled.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut schedule = Self::new();
        schedule.push(SpatialTransport::from_config(config));
        if config.flags.do_momentum_losses {
            schedule.push(MomentumTransport::from_config(config));
        }
        if config.flags.do_selfgeneration {
            schedule.push(SelfGeneration {
                waves: WaveSolver::from_config(config),
                diffusion: DiffusionModel::from_config(config),
                warmup_steps: config.run.warmup_steps,
            });
        }
        schedule
    }

    pub fn push<O: Operator + 'static>(&mut self, operator: O) {
        self.operators.push(Box::new(operator));
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    /// Geometry of the first operator that transports along the height axis.
    pub fn geometry(&self) -> Option<Geometry> {
        self.operators.iter().find_map(|op| op.geometry())
    }

    /// Operators sharing the source injection.
    pub fn transport_count(&self) -> usize {
        self.operators.iter().filter(|op| op.injects_source()).count()
    }

    /// Apply every active operator in order. Each operator completes
    /// before the next one reads the fields.
    pub fn apply_step(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<Vec<&'static str>> {
        let mut applied = Vec::with_capacity(self.operators.len());
        for op in &self.operators {
            if !op.is_active(ctx) {
                continue;
            }
            op.apply(fields, ctx)?;
            log::trace!("step {}: applied {}", ctx.step, op.name());
            applied.push(op.name());
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::build_fields;
    use crwaves_types::config::GeometryMode;

    fn small_config() -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.grid.p_size = 8;
        cfg.grid.z_size = 21;
        cfg.run.warmup_steps = 2;
        cfg
    }

    #[test]
    fn test_time_step_half() {
        let ts = TimeStep::new(0.4).unwrap();
        assert_eq!(ts.dt(), 0.4);
        assert_eq!(ts.dt_half(), 0.2);
        assert!(TimeStep::new(0.0).is_err());
        assert!(TimeStep::new(f64::NAN).is_err());
    }

    #[test]
    fn test_schedule_from_config() {
        let mut cfg = small_config();
        let schedule = OperatorSchedule::from_config(&cfg);
        assert_eq!(schedule.names(), vec!["spatial_transport", "self_generation"]);
        assert_eq!(schedule.transport_count(), 1);

        cfg.flags.do_momentum_losses = true;
        cfg.flags.do_selfgeneration = false;
        let schedule = OperatorSchedule::from_config(&cfg);
        assert_eq!(
            schedule.names(),
            vec!["spatial_transport", "momentum_transport"]
        );
        assert_eq!(schedule.transport_count(), 2);
    }

    #[test]
    fn test_schedule_geometry_follows_transport() {
        assert_eq!(OperatorSchedule::new().geometry(), None);

        let mut cfg = small_config();
        cfg.flags.geometry = GeometryMode::Spherical;
        let schedule = OperatorSchedule::from_config(&cfg);
        assert_eq!(schedule.geometry().map(|g| g.mode()), Some(GeometryMode::Spherical));

        let mut momentum_only = OperatorSchedule::new();
        momentum_only.push(MomentumTransport::new(false));
        assert_eq!(momentum_only.geometry(), None);
    }

    #[test]
    fn test_source_weight_split() {
        let ctx = StepContext {
            step: 1,
            t_now: 0.0,
            time: TimeStep::new(1.0).unwrap(),
            source_decay_time: 5.0,
            n_transport_ops: 2,
        };
        assert!((ctx.source_weight() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_self_generation_waits_for_warmup() {
        let cfg = small_config();
        let schedule = OperatorSchedule::from_config(&cfg);
        let mut fields = build_fields(&cfg).unwrap();
        let mut ctx = StepContext {
            step: 2,
            t_now: 2.0 * cfg.run.dt(),
            time: TimeStep::new(cfg.run.dt()).unwrap(),
            source_decay_time: cfg.source.decay_time(),
            n_transport_ops: schedule.transport_count(),
        };
        let applied = schedule.apply_step(&mut fields, &ctx).unwrap();
        assert_eq!(applied, vec!["spatial_transport"]);

        ctx.step = 3;
        let applied = schedule.apply_step(&mut fields, &ctx).unwrap();
        assert_eq!(applied, vec!["spatial_transport", "self_generation"]);
    }
}
