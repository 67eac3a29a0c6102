// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Text output for the command line.

use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::dashboard::{MetricTable, VersionPlot};
use crate::model::{Metric, Project};

/// Whole numbers print without decimals, everything else with two.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
    }
}

pub fn write_projects<W: Write>(out: W, projects: &[Project]) -> io::Result<()> {
    let mut tw = TabWriter::new(out);
    writeln!(tw, "ID\tNAME")?;
    for p in projects {
        writeln!(tw, "{}\t{}", p.id, p.name)?;
    }
    tw.flush()
}

pub fn write_metrics<W: Write>(out: W, metrics: &[Metric]) -> io::Result<()> {
    let mut tw = TabWriter::new(out);
    writeln!(tw, "ID\tMNEMONIC\tDESCRIPTION")?;
    for m in metrics {
        writeln!(tw, "{}\t{}\t{}", m.id, m.mnemonic, m.description)?;
    }
    tw.flush()
}

pub fn write_plot<W: Write>(out: W, plot: &VersionPlot) -> io::Result<()> {
    let mut tw = TabWriter::new(out);
    writeln!(tw, "{}", plot.label)?;
    writeln!(tw, "REVISION\tVALUE")?;
    for point in &plot.points {
        writeln!(tw, "{}\t{}", point.revision, format_value(Some(point.value)))?;
    }
    let missing = plot.sampled.len().saturating_sub(plot.points.len());
    if missing > 0 {
        writeln!(tw, "({missing} sampled revisions without a result)")?;
    }
    tw.flush()
}

pub fn write_table<W: Write>(out: W, table: &MetricTable) -> io::Result<()> {
    let mut tw = TabWriter::new(out);
    write!(tw, "{}", table.title)?;
    for column in &table.columns {
        write!(tw, "\t{}", column.mnemonic)?;
    }
    writeln!(tw)?;
    for row in &table.rows {
        write!(tw, "{}", row.name)?;
        for value in &row.values {
            write!(tw, "\t{}", format_value(*value))?;
        }
        writeln!(tw)?;
    }
    tw.flush()
}
