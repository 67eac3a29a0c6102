// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use srcmetrics::model::{
    Dir, Metric, MetricId, MetricType, Project, RawResult, ResourceId, Revision, SourceFile,
    Version,
};
use srcmetrics::{Backend, Error, Result};

pub const PROJECT: u64 = 1;

/// Version id the fake backend assigns to a revision.
pub fn version_id(revision: Revision) -> ResourceId {
    1000 + revision
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Projects,
    Metrics(MetricType),
    Latest(u64),
    First(u64),
    Versions(Vec<Revision>),
    Results(MetricId, Vec<ResourceId>),
    Dirs(Revision),
    Files(Revision, String),
}

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct FakeBackend {
    pub projects: Vec<Project>,
    pub revisions: Vec<Revision>,
    pub metrics: HashMap<MetricType, Vec<Metric>>,
    pub failing_metric_types: HashSet<MetricType>,
    /// (resource, metric) -> value
    pub results: HashMap<(ResourceId, MetricId), f64>,
    /// Returned verbatim by `results` when set.
    pub raw_results: Option<Vec<RawResult>>,
    pub fail_results: bool,
    pub dirs: HashMap<Revision, Vec<SourceFile>>,
    pub files: HashMap<(Revision, String), Vec<SourceFile>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    /// A project with the given revisions.
    pub fn with_revisions<I: IntoIterator<Item = Revision>>(revisions: I) -> Self {
        let mut revisions: Vec<Revision> = revisions.into_iter().collect();
        revisions.sort_unstable();
        Self {
            projects: vec![Project {
                id: PROJECT,
                name: "demo".to_string(),
            }],
            revisions,
            ..Default::default()
        }
    }

    pub fn metric(mut self, metric_type: MetricType, id: MetricId, mnemonic: &str) -> Self {
        self.metrics.entry(metric_type).or_default().push(Metric {
            id,
            mnemonic: mnemonic.to_string(),
            description: format!("{mnemonic} description"),
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn version(&self, revision: Revision) -> Version {
        Version {
            id: version_id(revision),
            revision_id: revision,
        }
    }
}

pub fn file(id: ResourceId, dir: &str, name: &str) -> SourceFile {
    SourceFile {
        id,
        name: name.to_string(),
        dir: Dir {
            path: dir.to_string(),
        },
    }
}

fn unavailable(what: &str) -> Error {
    Error::Backend {
        context: format!("failed to fetch {what}"),
        source: "connection refused".into(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn projects(&self) -> Result<Vec<Project>> {
        self.record(Call::Projects);
        Ok(self.projects.clone())
    }

    async fn metrics_by_type(&self, metric_type: MetricType) -> Result<Vec<Metric>> {
        self.record(Call::Metrics(metric_type));
        if self.failing_metric_types.contains(&metric_type) {
            return Err(unavailable("metrics"));
        }
        Ok(self.metrics.get(&metric_type).cloned().unwrap_or_default())
    }

    async fn latest_version(&self, project_id: u64) -> Result<Version> {
        self.record(Call::Latest(project_id));
        let rev = self.revisions.last().copied().ok_or_else(|| unavailable("latest version"))?;
        Ok(self.version(rev))
    }

    async fn first_version(&self, project_id: u64) -> Result<Version> {
        self.record(Call::First(project_id));
        let rev = self.revisions.first().copied().ok_or_else(|| unavailable("first version"))?;
        Ok(self.version(rev))
    }

    async fn versions(&self, _project_id: u64, revisions: &[Revision]) -> Result<Vec<Version>> {
        self.record(Call::Versions(revisions.to_vec()));
        Ok(revisions
            .iter()
            .filter(|r| self.revisions.contains(r))
            .map(|&r| self.version(r))
            .collect())
    }

    async fn results(
        &self,
        metric_id: MetricId,
        resource_ids: &[ResourceId],
    ) -> Result<Vec<RawResult>> {
        self.record(Call::Results(metric_id, resource_ids.to_vec()));
        if self.fail_results {
            return Err(unavailable("metric results"));
        }
        if let Some(raw) = &self.raw_results {
            return Ok(raw.clone());
        }
        Ok(resource_ids
            .iter()
            .filter_map(|&id| {
                self.results.get(&(id, metric_id)).map(|v| RawResult {
                    artifact_id: Some(id),
                    metric_id: Some(metric_id),
                    result: Some(json!(v)),
                })
            })
            .collect())
    }

    async fn dirs(&self, _project_id: u64, revision: Revision) -> Result<Vec<SourceFile>> {
        self.record(Call::Dirs(revision));
        Ok(self.dirs.get(&revision).cloned().unwrap_or_default())
    }

    async fn files(
        &self,
        _project_id: u64,
        revision: Revision,
        dir_path: &str,
    ) -> Result<Vec<SourceFile>> {
        self.record(Call::Files(revision, dir_path.to_string()));
        Ok(self
            .files
            .get(&(revision, dir_path.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
