//! File output sink: one tab-separated table per phase and frame.
//!
//! Tables are named `<stem>_<frame>-<phase number>.txt`. Each row holds the
//! 1-based block, cycle, step and increment, the elapsed time, temperature
//! and flux, then the selected strain, stress and internal-state entries.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mp_core::{PhaseId, VOIGT_LABELS};
use mp_path::OutputSpec;
use mp_phase::RveTree;
use mp_solver::{Frame, OutputRecord, OutputSink, SolverResult};
use tracing::{debug, info};

use crate::{ResultsError, ResultsResult};

pub fn table_file_name(stem: &str, frame: Frame, phase_number: u32) -> String {
    format!("{stem}_{frame}-{phase_number}.txt")
}

pub struct FileSink {
    dir: PathBuf,
    stem: String,
    tables: HashMap<(PhaseId, Frame), BufWriter<File>>,
    files: Vec<String>,
    rows: usize,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            tables: HashMap::new(),
            files: Vec::new(),
            rows: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the tables created by [`OutputSink::begin`], in creation order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Rows written over every table.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn open(&mut self, rve: &RveTree, spec: &OutputSpec) -> ResultsResult<()> {
        let mut numbers = HashSet::new();
        for node in rve.nodes() {
            let number = node.material().number;
            if !numbers.insert(number) {
                return Err(ResultsError::DuplicatePhaseNumber { number });
            }
        }

        fs::create_dir_all(&self.dir)?;
        self.tables.clear();
        self.files.clear();
        self.rows = 0;

        for id in rve.preorder() {
            let Ok(node) = rve.node(id) else {
                continue;
            };
            let material = node.material();
            let header = header(spec, spec.statev_indices(material.nstatev));
            for frame in Frame::BOTH {
                let name = table_file_name(&self.stem, frame, material.number);
                let mut out = BufWriter::new(File::create(self.dir.join(&name))?);
                writeln!(out, "{header}")?;
                debug!(file = %name, "opened result table");
                self.tables.insert((id, frame), out);
                self.files.push(name);
            }
        }
        Ok(())
    }

    fn append(&mut self, record: &OutputRecord) -> ResultsResult<()> {
        let out = self
            .tables
            .get_mut(&(record.phase, record.frame))
            .ok_or_else(|| ResultsError::NotOpen {
                phase_number: record.phase_number,
                frame: record.frame.to_string(),
            })?;

        let l = &record.location;
        write!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            l.block,
            l.cycle,
            l.step,
            l.increment,
            record.time,
            record.temperature,
            record.flux.unwrap_or(0.0)
        )?;
        for v in record
            .strain
            .iter()
            .chain(&record.stress)
            .chain(&record.statev)
        {
            write!(out, "\t{v}")?;
        }
        writeln!(out)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> ResultsResult<()> {
        for out in self.tables.values_mut() {
            out.flush()?;
        }
        info!(
            dir = %self.dir.display(),
            tables = self.tables.len(),
            rows = self.rows,
            "flushed result tables"
        );
        Ok(())
    }
}

fn header(spec: &OutputSpec, statev: Vec<usize>) -> String {
    let mut cols: Vec<String> = ["block", "cycle", "step", "increment", "time", "T", "Q"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cols.extend(spec.strain.iter().map(|k| format!("E{}", VOIGT_LABELS[*k])));
    cols.extend(spec.stress.iter().map(|k| format!("S{}", VOIGT_LABELS[*k])));
    cols.extend(statev.iter().map(|i| format!("statev{i}")));
    format!("#{}", cols.join("\t"))
}

impl OutputSink for FileSink {
    fn begin(&mut self, rve: &RveTree, spec: &OutputSpec) -> SolverResult<()> {
        Ok(self.open(rve, spec)?)
    }

    fn write(&mut self, record: &OutputRecord) -> SolverResult<()> {
        Ok(self.append(record)?)
    }

    fn finish(&mut self) -> SolverResult<()> {
        Ok(self.flush()?)
    }
}
