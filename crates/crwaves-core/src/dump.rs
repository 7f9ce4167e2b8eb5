// ─────────────────────────────────────────────────────────────────────
// CR Waves — Snapshot Dumps
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Snapshot persistence. Archives are flat `.npz` files holding the
//! diagnostic fields, both axes and the simulated time.

use crwaves_types::error::CrwResult;
use crwaves_types::state::CrFields;
use crwaves_types::units::KYR;
use ndarray::Array1;
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::{Path, PathBuf};

/// State handed to a sink at a dump point.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub step: usize,
    /// Simulated time [s]
    pub t: f64,
    pub fields: &'a CrFields,
}

pub trait SnapshotSink {
    fn write(&mut self, snapshot: &Snapshot<'_>) -> CrwResult<()>;
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&mut self, _snapshot: &Snapshot<'_>) -> CrwResult<()> {
        Ok(())
    }
}

/// `<tag>_t<time in kyr>.npz`
pub fn generate_output_filename(tag: &str, t: f64) -> String {
    format!("{}_t{:08.2}kyr.npz", tag, t / KYR)
}

#[derive(Debug, Clone)]
pub struct NpzDumper {
    output_dir: PathBuf,
    tag: String,
    written: Vec<PathBuf>,
}

impl NpzDumper {
    /// Creates `output_dir` if it does not exist.
    pub fn new<P: AsRef<Path>>(output_dir: P, tag: &str) -> CrwResult<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(NpzDumper {
            output_dir,
            tag: tag.to_string(),
            written: Vec::new(),
        })
    }

    /// Archives written so far, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// `<tag>_analytic_t<kyr>.npz` with the evolved f_cr next to the
    /// closed-form profile `f_exact`.
    pub fn write_analytic_test(
        &mut self,
        snapshot: &Snapshot<'_>,
        exact: &Array1<f64>,
    ) -> CrwResult<PathBuf> {
        let tag = format!("{}_analytic", self.tag);
        let path = self
            .output_dir
            .join(generate_output_filename(&tag, snapshot.t));
        let fields = snapshot.fields;
        let mut writer = NpzWriter::new(File::create(&path)?);
        writer.add_array("f_cr", &fields.f_cr)?;
        writer.add_array("f_exact", exact)?;
        writer.add_array("z", fields.z.values())?;
        writer.add_array("t", &Array1::from_elem(1, snapshot.t))?;
        writer.finish()?;
        log::debug!("step {}: wrote {}", snapshot.step, path.display());
        self.written.push(path.clone());
        Ok(path)
    }
}

impl SnapshotSink for NpzDumper {
    fn write(&mut self, snapshot: &Snapshot<'_>) -> CrwResult<()> {
        let path = self
            .output_dir
            .join(generate_output_filename(&self.tag, snapshot.t));
        let fields = snapshot.fields;
        let file = File::create(&path)?;
        let mut writer = NpzWriter::new(file);
        writer.add_array("f_cr", &fields.f_cr)?;
        writer.add_array("df_dz", &fields.df_dz)?;
        writer.add_array("D_zz", &fields.d_zz)?;
        writer.add_array("W_sg", &fields.w_sg)?;
        writer.add_array("p", fields.p.values())?;
        writer.add_array("z", fields.z.values())?;
        writer.add_array("t", &Array1::from_elem(1, snapshot.t))?;
        writer.finish()?;
        log::info!("step {}: wrote {}", snapshot.step, path.display());
        self.written.push(path);
        Ok(())
    }
}
