//! Human-readable budget dumps and summary statistics.

use crate::error::BudgetError;
use crate::set::BudgetSet;
use crate::store::BudgetStore;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::NS;

fn write_section<W: Write>(w: &mut W, title: &str, table: &NetPinTable) -> io::Result<()> {
    writeln!(w, "{title}:")?;
    for (inet, row) in table.rows().iter().enumerate() {
        write!(w, "\nNet: {inet}            ")?;
        for value in row.iter().skip(1) {
            write!(w, "{value:.6e} ")?;
        }
    }
    writeln!(w)
}

/// Writes all five tables of `store`, one line per net, sinks in pin order.
pub fn write_report<W: Write>(w: &mut W, store: &BudgetStore) -> io::Result<()> {
    let sections = [
        ("Minimum Delay Budgets", store.min()),
        ("Maximum Delay Budgets", store.max()),
        ("Target Delay Budgets", store.target()),
        ("Delay lower_bound", store.lower_bound()),
        ("Delay upper_bound", store.upper_bound()),
    ];
    for (i, (title, table)) in sections.into_iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        write_section(w, title, table)?;
    }
    Ok(())
}

fn write_file(
    path: &Path,
    render: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), BudgetError> {
    let resource = |source| BudgetError::Resource {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(resource)?;
    let mut w = BufWriter::new(file);
    render(&mut w).and_then(|_| w.flush()).map_err(resource)
}

/// Writes one intermediate budget table.
pub fn dump_temporary(table: &NetPinTable, path: &Path) -> Result<(), BudgetError> {
    write_file(path, |w| write_section(w, "Temporary Budgets", table))
}

impl BudgetSet {
    /// Writes the full budget report to `path`. Fails on an inactive set.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), BudgetError> {
        let store = self
            .store()
            .ok_or_else(|| BudgetError::precondition("cannot dump inactive route budgets"))?;
        let path = path.as_ref();
        write_file(path, |w| write_report(w, store))?;
        log::info!("Route budgets written to {}", path.display());
        Ok(())
    }
}

/// Min / mean / max of one budget column over every sink.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ColumnStats {
    fn of(table: &NetPinTable) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (_, _, v) in table.sinks() {
            count += 1;
            sum += v;
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min: lo,
            mean: sum / count as f64,
            max: hi,
        }
    }
}

impl fmt::Display for ColumnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}/{:.3}/{:.3} ns",
            self.min / NS,
            self.mean / NS,
            self.max / NS
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BudgetSummary {
    pub sinks: usize,
    pub min: ColumnStats,
    pub max: ColumnStats,
    pub target: ColumnStats,
}

impl BudgetSummary {
    pub fn of(store: &BudgetStore) -> Self {
        Self {
            sinks: store.min().sinks().count(),
            min: ColumnStats::of(store.min()),
            max: ColumnStats::of(store.max()),
            target: ColumnStats::of(store.target()),
        }
    }
}

impl fmt::Display for BudgetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sinks, min {} | max {} | target {} (min/mean/max)",
            self.sinks, self.min, self.max, self.target
        )
    }
}
