// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Dashboard pipeline: selection handling and view assembly.
//!
//! Every view is built the same way: work out which ids are missing from the
//! session caches, fetch only those, then read the view from the caches.

use log::{info, warn};
use std::collections::HashMap;

use crate::backend::Backend;
use crate::errors::{Error, Result};
use crate::model::{
    Metric, MetricId, MetricType, Project, RawResult, ResourceId, Revision, SourceFile, Version,
};
use crate::session::{Epoch, Pending, ResultsRequest, Session};

/// Metrics available per metric type, loaded once at startup.
#[derive(Debug, Default)]
pub struct MetricCatalog {
    by_type: HashMap<MetricType, Vec<Metric>>,
}

impl MetricCatalog {
    pub fn metrics(&self, metric_type: MetricType) -> &[Metric] {
        self.by_type
            .get(&metric_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, metric_id: MetricId) -> Option<&Metric> {
        self.by_type
            .values()
            .flatten()
            .find(|m| m.id == metric_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub revision: Revision,
    pub version_id: ResourceId,
    pub value: f64,
}

/// Values of one metric across the sampled revisions of the selected range.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionPlot {
    pub metric_id: MetricId,
    pub label: String,
    /// Revisions asked for, including those without a point.
    pub sampled: Vec<Revision>,
    pub points: Vec<PlotPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: ResourceId,
    pub name: String,
    /// One cell per table column; `None` when the backend had no result.
    pub values: Vec<Option<f64>>,
}

/// Directory or file listing with a column per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub title: String,
    pub columns: Vec<Metric>,
    pub rows: Vec<TableRow>,
}

pub struct Dashboard<B> {
    backend: B,
    catalog: MetricCatalog,
    epoch: Epoch,
    session: Option<Session>,
    default_sample_size: usize,
    max_sample_size: usize,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(backend: B, default_sample_size: usize, max_sample_size: usize) -> Self {
        Self {
            backend,
            catalog: MetricCatalog::default(),
            epoch: Epoch::default(),
            session: None,
            default_sample_size: default_sample_size.min(max_sample_size),
            max_sample_size,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn session_ref(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NoProjectSelected)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(Error::NoProjectSelected)
    }

    /// Fetch the metrics of every type. A type that fails to load is logged
    /// and left empty.
    pub async fn load_metric_catalog(&mut self) {
        for metric_type in MetricType::ALL {
            match self.backend.metrics_by_type(metric_type).await {
                Ok(metrics) => {
                    info!("loaded {} {metric_type} metrics", metrics.len());
                    self.catalog.by_type.insert(metric_type, metrics);
                }
                Err(e) => warn!("no metrics of type {metric_type}: {e}"),
            }
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.backend.projects().await
    }

    /// Start a new session for `project_id` spanning its first to latest
    /// version. The previous session and its caches are dropped first.
    pub async fn select_project(&mut self, project_id: u64) -> Result<&Session> {
        self.epoch = self.epoch.next();
        self.session = None;

        let latest = self.backend.latest_version(project_id).await?;
        let first = self.backend.first_version(project_id).await?;
        info!(
            "selected project {project_id}: revisions {}-{} (epoch {})",
            first.revision_id, latest.revision_id, self.epoch
        );

        let session = Session::new(
            self.epoch,
            project_id,
            first,
            latest,
            self.default_sample_size,
        );
        Ok(&*self.session.insert(session))
    }

    /// Replace the session with one covering `min..=max` and select the
    /// version at `max`.
    pub async fn select_range(&mut self, min: Revision, max: Revision) -> Result<&Session> {
        let current = self.session_ref()?;
        let (first, latest) = (current.first(), current.latest());
        if min > max || min < first.revision_id || max > latest.revision_id {
            return Err(Error::RangeOutOfBounds {
                min,
                max,
                first: first.revision_id,
                latest: latest.revision_id,
            });
        }

        let selected = match current.versions().get(max) {
            Some(version) => *version,
            None => self
                .backend
                .versions(current.project_id(), &[max])
                .await?
                .into_iter()
                .find(|v| v.revision_id == max)
                .ok_or(Error::UnknownRevision(max))?,
        };

        self.epoch = self.epoch.next();
        let previous = self.session_ref()?;
        let session = Session::with_range(self.epoch, previous, min, max, selected);
        info!("selected revisions {min}-{max} (epoch {})", self.epoch);
        Ok(&*self.session.insert(session))
    }

    /// Clamped to the configured maximum. Caches are kept.
    pub fn set_sample_size(&mut self, sample_size: usize) -> Result<usize> {
        let sample_size = sample_size.min(self.max_sample_size);
        self.session_mut()?.set_sample_size(sample_size);
        Ok(sample_size)
    }

    /// Store a versions response in the current session. Returns `false`
    /// when it was issued by an earlier selection and has been dropped.
    pub fn apply_versions(
        &mut self,
        pending: Pending<Vec<Revision>>,
        versions: Vec<Version>,
    ) -> Result<bool> {
        Ok(self.session_mut()?.complete_versions(pending, versions))
    }

    /// Store a results response in the current session, see
    /// [`apply_versions`](Self::apply_versions).
    pub fn apply_results(
        &mut self,
        pending: Pending<ResultsRequest>,
        raw: Vec<RawResult>,
    ) -> Result<bool> {
        self.session_mut()?.complete_results(pending, raw)
    }

    async fn fetch_versions(&mut self, revisions: &[Revision]) -> Result<()> {
        let session = self.session_ref()?;
        let Some(pending) = session.begin_versions(revisions) else {
            return Ok(());
        };
        let versions = self
            .backend
            .versions(session.project_id(), &pending.request)
            .await?;
        self.apply_versions(pending, versions)?;
        Ok(())
    }

    async fn fetch_results(&mut self, resource_ids: &[ResourceId], metric_id: MetricId) -> Result<()> {
        let Some(pending) = self.session_ref()?.begin_results(resource_ids, metric_id) else {
            return Ok(());
        };
        let raw = self
            .backend
            .results(metric_id, &pending.request.resource_ids)
            .await?;
        self.apply_results(pending, raw)?;
        Ok(())
    }

    /// Plot `metric_id` over the revisions sampled from the selected range.
    pub async fn version_plot(&mut self, metric_id: MetricId) -> Result<VersionPlot> {
        let sampled = self.session_ref()?.sampled_revisions();
        self.fetch_versions(&sampled).await?;

        let resolved = self.session_ref()?.versions().resolve(&sampled);
        let version_ids: Vec<ResourceId> = resolved.iter().map(|&(_, id)| id).collect();
        self.fetch_results(&version_ids, metric_id).await?;

        let results = self.session_ref()?.results();
        let points = resolved
            .into_iter()
            .filter_map(|(revision, version_id)| {
                results.lookup(version_id, metric_id).map(|r| PlotPoint {
                    revision,
                    version_id,
                    value: r.value,
                })
            })
            .collect();

        let label = self
            .catalog
            .find(metric_id)
            .map(Metric::label)
            .unwrap_or_else(|| format!("metric {metric_id}"));

        Ok(VersionPlot {
            metric_id,
            label,
            sampled,
            points,
        })
    }

    async fn fill_table(
        &mut self,
        title: String,
        metric_type: MetricType,
        entries: Vec<(ResourceId, String)>,
    ) -> Result<MetricTable> {
        let columns = self.catalog.metrics(metric_type).to_vec();
        let ids: Vec<ResourceId> = entries.iter().map(|(id, _)| *id).collect();
        if !ids.is_empty() {
            for metric in &columns {
                self.fetch_results(&ids, metric.id).await?;
            }
        }

        let results = self.session_ref()?.results();
        let rows = entries
            .into_iter()
            .map(|(id, name)| TableRow {
                id,
                name,
                values: columns
                    .iter()
                    .map(|m| results.lookup(id, m.id).map(|r| r.value))
                    .collect(),
            })
            .collect();

        Ok(MetricTable {
            title,
            columns,
            rows,
        })
    }

    /// Directories of the selected version with their directory metrics.
    pub async fn directories(&mut self) -> Result<MetricTable> {
        let session = self.session_ref()?;
        if let Some(pending) = session.begin_dirs() {
            let dirs = self
                .backend
                .dirs(session.project_id(), pending.request.revision_id)
                .await?;
            info!(
                "found {} directories in revision {}",
                dirs.len(),
                pending.request.revision_id
            );
            self.session_mut()?.complete_dirs(pending, dirs);
        }

        let entries = self
            .session_ref()?
            .dirs()
            .iter()
            .map(|d| (d.id, d.path()))
            .collect();
        self.fill_table("Directories".to_string(), MetricType::SourceDirectory, entries)
            .await
    }

    /// Files directly under `dir_path` in the selected version.
    pub async fn files(&mut self, dir_path: &str) -> Result<MetricTable> {
        let session = self.session_ref()?;
        if let Some(pending) = session.begin_files(dir_path) {
            let files = self
                .backend
                .files(
                    session.project_id(),
                    pending.request.revision,
                    &pending.request.dir_path,
                )
                .await?;
            self.session_mut()?.complete_files(pending, files);
        }

        let entries = self
            .session_ref()?
            .files(dir_path)
            .iter()
            .map(|f: &SourceFile| (f.id, f.name.clone()))
            .collect();
        self.fill_table(format!("Files in {dir_path}"), MetricType::SourceFile, entries)
            .await
    }
}
