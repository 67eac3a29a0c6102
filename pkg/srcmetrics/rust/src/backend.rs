// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Access to the metrics backend proxy.

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::model::{
    FileEntry, Metric, MetricEntry, MetricId, MetricType, Project, ProjectEntry, RawResult,
    ResourceId, ResultEntry, Revision, SourceFile, Version, VersionEntry,
};

/// Calls the dashboard makes against the backend proxy.
///
/// Failures of any kind surface as [`Error::Backend`]; callers do not retry.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn projects(&self) -> Result<Vec<Project>>;

    async fn metrics_by_type(&self, metric_type: MetricType) -> Result<Vec<Metric>>;

    async fn latest_version(&self, project_id: u64) -> Result<Version>;

    async fn first_version(&self, project_id: u64) -> Result<Version>;

    /// Version descriptors for the given revisions. Revisions the backend
    /// does not know are left out of the response.
    async fn versions(&self, project_id: u64, revisions: &[Revision]) -> Result<Vec<Version>>;

    /// Unvalidated results of `metric_id` for each resource.
    async fn results(
        &self,
        metric_id: MetricId,
        resource_ids: &[ResourceId],
    ) -> Result<Vec<RawResult>>;

    async fn dirs(&self, project_id: u64, revision: Revision) -> Result<Vec<SourceFile>>;

    /// Files directly under `dir_path` (an absolute path such as `/src`).
    async fn files(
        &self,
        project_id: u64,
        revision: Revision,
        dir_path: &str,
    ) -> Result<Vec<SourceFile>>;
}

/// [`Backend`] over the proxy's JSON HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// `proxy_url` is the server root, `prefix` the path the web client is
    /// mounted under (usually `/web`).
    pub fn new(proxy_url: &str, prefix: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Backend {
                context: "failed to create HTTP client".to_string(),
                source: e.into(),
            })?;

        let prefix = prefix.trim_matches('/');
        let mut base_url = proxy_url.trim_end_matches('/').to_string();
        if !prefix.is_empty() {
            base_url.push('/');
            base_url.push_str(prefix);
        }

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let url = format!("{}/proxy{}", self.base_url, path);
        debug!("GET {url}");

        let backend_err = |context: String| {
            move |e: reqwest::Error| Error::Backend {
                context,
                source: e.into(),
            }
        };

        self.client
            .get(&url)
            .send()
            .await
            .map_err(backend_err(format!("failed to fetch {what}")))?
            .error_for_status()
            .map_err(backend_err(format!("no {what} found")))?
            .json()
            .await
            .map_err(backend_err(format!("failed to parse {what} response")))
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Backend for HttpBackend {
    async fn projects(&self) -> Result<Vec<Project>> {
        let entries: Vec<ProjectEntry> = self.get_json("/project", "projects").await?;
        Ok(entries.into_iter().map(|e| e.project).collect())
    }

    async fn metrics_by_type(&self, metric_type: MetricType) -> Result<Vec<Metric>> {
        let path = format!("/metrics/by-type/{metric_type}");
        let entries: Vec<MetricEntry> = self.get_json(&path, "metrics").await?;
        Ok(entries.into_iter().map(|e| e.metric).collect())
    }

    async fn latest_version(&self, project_id: u64) -> Result<Version> {
        let path = format!("/project/{project_id}/version/latest");
        let entry: VersionEntry = self.get_json(&path, "latest version").await?;
        Ok(entry.version)
    }

    async fn first_version(&self, project_id: u64) -> Result<Version> {
        let path = format!("/project/{project_id}/version/first");
        let entry: VersionEntry = self.get_json(&path, "first version").await?;
        Ok(entry.version)
    }

    async fn versions(&self, project_id: u64, revisions: &[Revision]) -> Result<Vec<Version>> {
        let path = format!("/project/{project_id}/versions/{}", join_ids(revisions));
        let entries: Vec<VersionEntry> = self.get_json(&path, "versions").await?;
        Ok(entries.into_iter().map(|e| e.version).collect())
    }

    async fn results(
        &self,
        metric_id: MetricId,
        resource_ids: &[ResourceId],
    ) -> Result<Vec<RawResult>> {
        let path = format!(
            "/metrics/by-id/{metric_id}/result/{}",
            join_ids(resource_ids)
        );
        let entries: Vec<ResultEntry> = self.get_json(&path, "metric results").await?;
        Ok(entries.into_iter().map(|e| e.r).collect())
    }

    async fn dirs(&self, project_id: u64, revision: Revision) -> Result<Vec<SourceFile>> {
        let path = format!("/project/{project_id}/version/{revision}/dirs/");
        let entries: Vec<FileEntry> = self.get_json(&path, "directories").await?;
        Ok(entries.into_iter().map(|e| e.file).collect())
    }

    async fn files(
        &self,
        project_id: u64,
        revision: Revision,
        dir_path: &str,
    ) -> Result<Vec<SourceFile>> {
        let path = format!("/project/{project_id}/versions/{revision}/files{dir_path}");
        let entries: Vec<FileEntry> = self.get_json(&path, "files").await?;
        Ok(entries.into_iter().map(|e| e.file).collect())
    }
}
