// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use srcmetrics::config::{self, DashboardConfig};
use srcmetrics::model::{MetricType, Revision};
use srcmetrics::{Dashboard, HttpBackend, render};

#[derive(Parser, Debug)]
#[command(name = "srcmetrics")]
#[command(about = "Browse project source metrics through the metrics backend proxy")]
#[command(version)]
struct Args {
    /// Config file (defaults to $SRCMETRICS_CONFIG or /etc/srcmetrics/dashboard.yaml)
    #[arg(short, long, env = "SRCMETRICS_CONFIG")]
    config: Option<PathBuf>,

    /// Backend proxy root URL, overrides the config file
    #[arg(long, env = "SRCMETRICS_PROXY_URL")]
    proxy_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Project and revision range selection shared by the per-project commands.
#[derive(clap::Args, Debug)]
struct Selection {
    /// Project id
    #[arg(short, long)]
    project: u64,

    /// First revision of the range (defaults to the project's first)
    #[arg(long)]
    from: Option<Revision>,

    /// Last revision of the range (defaults to the project's latest)
    #[arg(long)]
    to: Option<Revision>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List projects
    Projects,
    /// List metrics, optionally of one type
    Metrics {
        #[arg(short = 't', long = "type")]
        metric_type: Option<MetricType>,
    },
    /// Print a metric's value across sampled revisions
    Plot {
        #[command(flatten)]
        selection: Selection,
        /// Metric id (a PROJECT_VERSION metric)
        #[arg(short, long)]
        metric: u64,
        /// Number of samples over the range
        #[arg(short, long)]
        samples: Option<usize>,
    },
    /// Print directories of the last revision in the range with their metrics
    Dirs {
        #[command(flatten)]
        selection: Selection,
    },
    /// Print files of a directory with their metrics
    Files {
        #[command(flatten)]
        selection: Selection,
        /// Directory path, e.g. /src/core
        #[arg(short, long)]
        dir: String,
    },
}

async fn select(dashboard: &mut Dashboard<HttpBackend>, selection: &Selection) -> Result<()> {
    let session = dashboard
        .select_project(selection.project)
        .await
        .with_context(|| format!("selecting project {}", selection.project))?;
    let (first, latest) = session.range();

    if selection.from.is_some() || selection.to.is_some() {
        let min = selection.from.unwrap_or(first);
        let max = selection.to.unwrap_or(latest);
        dashboard
            .select_range(min, max)
            .await
            .with_context(|| format!("selecting revisions {min}-{max}"))?;
    }
    Ok(())
}

async fn run(config: DashboardConfig, command: Command) -> Result<()> {
    let backend = HttpBackend::new(
        &config.proxy_url,
        &config.prefix,
        Duration::from_secs(config.timeout_secs),
    )?;
    debug!("using backend at {}", backend.base_url());

    let mut dashboard = Dashboard::new(
        backend,
        config.default_sample_size,
        config.max_sample_size,
    );
    let stdout = io::stdout().lock();

    match command {
        Command::Projects => {
            let projects = dashboard.list_projects().await.context("no projects found")?;
            render::write_projects(stdout, &projects)?;
        }
        Command::Metrics { metric_type } => {
            dashboard.load_metric_catalog().await;
            let metrics: Vec<_> = match metric_type {
                Some(t) => dashboard.catalog().metrics(t).to_vec(),
                None => MetricType::ALL
                    .iter()
                    .flat_map(|&t| dashboard.catalog().metrics(t).to_vec())
                    .collect(),
            };
            render::write_metrics(stdout, &metrics)?;
        }
        Command::Plot {
            selection,
            metric,
            samples,
        } => {
            dashboard.load_metric_catalog().await;
            select(&mut dashboard, &selection).await?;
            if let Some(samples) = samples {
                let applied = dashboard.set_sample_size(samples)?;
                if applied != samples {
                    info!("sample size capped at {applied}");
                }
            }
            let plot = dashboard
                .version_plot(metric)
                .await
                .with_context(|| format!("plotting metric {metric}"))?;
            render::write_plot(stdout, &plot)?;
        }
        Command::Dirs { selection } => {
            dashboard.load_metric_catalog().await;
            select(&mut dashboard, &selection).await?;
            let table = dashboard.directories().await.context("listing directories")?;
            render::write_table(stdout, &table)?;
        }
        Command::Files { selection, dir } => {
            dashboard.load_metric_catalog().await;
            select(&mut dashboard, &selection).await?;
            let table = dashboard
                .files(&dir)
                .await
                .with_context(|| format!("listing files in {dir}"))?;
            render::write_table(stdout, &table)?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log at info until the config has been read, then switch to its level
    simple_logger::init_with_level(log::Level::Trace)?;
    log::set_max_level(log::LevelFilter::Info);

    let config_path = args.config.unwrap_or_else(config::config_path);
    let mut config = config::load_config(&config_path)?;
    if let Some(url) = args.proxy_url {
        config.proxy_url = url;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    let log_level: log::LevelFilter = config
        .log_level
        .parse()
        .with_context(|| format!("invalid log level: {}", config.log_level))?;
    log::set_max_level(log_level);

    run(config, args.command).await
}
