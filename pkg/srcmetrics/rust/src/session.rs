// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! State owned by one project/version-range selection.
//!
//! A [`Session`] is created when a project is selected and replaced wholesale
//! when another project or version range is selected. Each session carries the
//! [`Epoch`] it was created in. Fetches are split into a `begin_*` step, which
//! works out what is missing and stamps the request with the epoch, and a
//! `complete_*` step, which stores the response only if the epoch still
//! matches. Responses to requests issued by an earlier session are dropped.

use log::debug;
use std::collections::HashMap;
use std::fmt;

use crate::cache::{ResultCache, VersionCache};
use crate::errors::Result;
use crate::model::{MetricId, RawResult, ResourceId, ResultRecord, Revision, SourceFile, Version};
use crate::sampler;

/// Generation counter of selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request stamped with the epoch of the session that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<T> {
    pub epoch: Epoch,
    pub request: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsRequest {
    pub metric_id: MetricId,
    pub resource_ids: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesRequest {
    pub revision: Revision,
    pub dir_path: String,
}

#[derive(Debug)]
pub struct Session {
    epoch: Epoch,
    project_id: u64,
    first: Version,
    latest: Version,
    min_revision: Revision,
    max_revision: Revision,
    sample_size: usize,
    selected_version: Version,
    results: ResultCache,
    versions: VersionCache,
    /// Directories of `dirs_version`.
    dirs: Vec<SourceFile>,
    dirs_version: Option<ResourceId>,
    /// dir path -> files of the selected version
    files: HashMap<String, Vec<SourceFile>>,
}

impl Session {
    /// Session spanning `first..=latest` with `latest` selected.
    pub fn new(epoch: Epoch, project_id: u64, first: Version, latest: Version, sample_size: usize) -> Self {
        let mut versions = VersionCache::new();
        versions.insert_batch([first, latest]);

        Self {
            epoch,
            project_id,
            first,
            latest,
            min_revision: first.revision_id,
            max_revision: latest.revision_id,
            sample_size,
            selected_version: latest,
            results: ResultCache::new(),
            versions,
            dirs: Vec::new(),
            dirs_version: None,
            files: HashMap::new(),
        }
    }

    /// Narrow to `min..=max`, selecting `selected` (the version at `max`).
    /// Bounds are checked by the caller.
    pub(crate) fn with_range(
        epoch: Epoch,
        previous: &Session,
        min: Revision,
        max: Revision,
        selected: Version,
    ) -> Self {
        let mut session = Session::new(
            epoch,
            previous.project_id,
            previous.first,
            previous.latest,
            previous.sample_size,
        );
        session.min_revision = min;
        session.max_revision = max;
        session.selected_version = selected;
        session.versions.insert_batch([selected]);
        session
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn first(&self) -> Version {
        self.first
    }

    pub fn latest(&self) -> Version {
        self.latest
    }

    pub fn range(&self) -> (Revision, Revision) {
        (self.min_revision, self.max_revision)
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub(crate) fn set_sample_size(&mut self, sample_size: usize) {
        self.sample_size = sample_size;
    }

    pub fn selected_version(&self) -> Version {
        self.selected_version
    }

    pub fn results(&self) -> &ResultCache {
        &self.results
    }

    pub fn versions(&self) -> &VersionCache {
        &self.versions
    }

    /// Revisions sampled over the selected range.
    pub fn sampled_revisions(&self) -> Vec<Revision> {
        sampler::sample(self.sample_size, self.min_revision, self.max_revision)
    }

    fn is_current(&self, epoch: Epoch, what: &str) -> bool {
        if epoch != self.epoch {
            debug!(
                "discarding stale {what} response from epoch {epoch} (current {})",
                self.epoch
            );
            return false;
        }
        true
    }

    /// `None` when every revision is already cached.
    pub fn begin_versions(&self, revisions: &[Revision]) -> Option<Pending<Vec<Revision>>> {
        let missing = self.versions.pending_revisions(revisions);
        if missing.is_empty() {
            return None;
        }
        Some(Pending {
            epoch: self.epoch,
            request: missing,
        })
    }

    /// Returns whether the response was stored.
    pub fn complete_versions(&mut self, pending: Pending<Vec<Revision>>, versions: Vec<Version>) -> bool {
        if !self.is_current(pending.epoch, "versions") {
            return false;
        }
        debug!(
            "caching {} of {} requested versions",
            versions.len(),
            pending.request.len()
        );
        self.versions.insert_batch(versions);
        true
    }

    /// `None` when every resource already has a result for `metric_id`.
    pub fn begin_results(
        &self,
        resource_ids: &[ResourceId],
        metric_id: MetricId,
    ) -> Option<Pending<ResultsRequest>> {
        let missing = self.results.pending_resource_ids(resource_ids, metric_id);
        if missing.is_empty() {
            return None;
        }
        Some(Pending {
            epoch: self.epoch,
            request: ResultsRequest {
                metric_id,
                resource_ids: missing,
            },
        })
    }

    /// Validates the whole batch before caching any of it. Returns whether the
    /// response was stored.
    pub fn complete_results(
        &mut self,
        pending: Pending<ResultsRequest>,
        raw: Vec<RawResult>,
    ) -> Result<bool> {
        if !self.is_current(pending.epoch, "results") {
            return Ok(false);
        }
        let records = raw
            .into_iter()
            .map(ResultRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "caching {} results for metric {}",
            records.len(),
            pending.request.metric_id
        );
        self.results.record_batch(records);
        Ok(true)
    }

    /// `None` when the directories of the selected version are cached.
    pub fn begin_dirs(&self) -> Option<Pending<Version>> {
        if self.dirs_version == Some(self.selected_version.id) {
            return None;
        }
        Some(Pending {
            epoch: self.epoch,
            request: self.selected_version,
        })
    }

    pub fn complete_dirs(&mut self, pending: Pending<Version>, dirs: Vec<SourceFile>) -> bool {
        if !self.is_current(pending.epoch, "directories") {
            return false;
        }
        self.dirs = dirs;
        self.dirs_version = Some(pending.request.id);
        self.files.clear();
        true
    }

    pub fn dirs(&self) -> &[SourceFile] {
        &self.dirs
    }

    /// `None` when files for `dir_path` are cached. An empty listing is
    /// fetched again.
    pub fn begin_files(&self, dir_path: &str) -> Option<Pending<FilesRequest>> {
        if self.files.get(dir_path).is_some_and(|f| !f.is_empty()) {
            return None;
        }
        Some(Pending {
            epoch: self.epoch,
            request: FilesRequest {
                revision: self.selected_version.revision_id,
                dir_path: dir_path.to_string(),
            },
        })
    }

    pub fn complete_files(&mut self, pending: Pending<FilesRequest>, files: Vec<SourceFile>) -> bool {
        if !self.is_current(pending.epoch, "files") {
            return false;
        }
        self.files.insert(pending.request.dir_path, files);
        true
    }

    pub fn files(&self, dir_path: &str) -> &[SourceFile] {
        self.files.get(dir_path).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::model::Dir;
    use serde_json::json;

    fn version(id: ResourceId, revision_id: Revision) -> Version {
        Version { id, revision_id }
    }

    fn session(epoch: Epoch) -> Session {
        Session::new(epoch, 7, version(100, 0), version(200, 100), 25)
    }

    fn raw(artifact_id: ResourceId, metric_id: MetricId, value: f64) -> RawResult {
        RawResult {
            artifact_id: Some(artifact_id),
            metric_id: Some(metric_id),
            result: Some(json!(value)),
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session(Epoch::default());
        assert_eq!(s.range(), (0, 100));
        assert_eq!(s.selected_version(), version(200, 100));
        assert_eq!(s.sampled_revisions().len(), 26);
        // first and latest are known without a fetch
        assert_eq!(s.versions().version_id(0), Some(100));
        assert_eq!(s.versions().version_id(100), Some(200));
    }

    #[test]
    fn test_begin_versions_only_requests_missing() {
        let s = session(Epoch::default());
        let pending = s.begin_versions(&[0, 4, 8, 100]).unwrap();
        assert_eq!(pending.request, vec![4, 8]);
        assert!(s.begin_versions(&[0, 100]).is_none());
    }

    #[test]
    fn test_results_round() {
        let mut s = session(Epoch::default());
        let pending = s.begin_results(&[1, 2], 5).unwrap();
        assert!(s.complete_results(pending, vec![raw(1, 5, 3.0)]).unwrap());

        assert_eq!(s.results().lookup(1, 5).map(|r| r.value), Some(3.0));
        let pending = s.begin_results(&[1, 2], 5).unwrap();
        assert_eq!(pending.request.resource_ids, vec![2]);
    }

    #[test]
    fn test_invalid_batch_is_not_cached() {
        let mut s = session(Epoch::default());
        let pending = s.begin_results(&[1, 2], 5).unwrap();
        let bad = RawResult {
            artifact_id: Some(2),
            metric_id: None,
            result: Some(json!(1)),
        };
        let err = s
            .complete_results(pending, vec![raw(1, 5, 3.0), bad])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { field: "metricId" }));
        assert!(s.results().is_empty());
    }

    #[test]
    fn test_stale_epoch_discarded() {
        let old = session(Epoch::default());
        let pending = old.begin_results(&[1], 5).unwrap();

        let mut current = session(Epoch::default().next());
        assert!(!current.complete_results(pending, vec![raw(1, 5, 3.0)]).unwrap());
        assert!(current.results().lookup(1, 5).is_none());
    }

    #[test]
    fn test_dirs_cached_per_version() {
        let mut s = session(Epoch::default());
        let pending = s.begin_dirs().unwrap();
        let dirs = vec![SourceFile {
            id: 9,
            name: "src".to_string(),
            dir: Dir {
                path: "/".to_string(),
            },
        }];
        assert!(s.complete_dirs(pending, dirs));
        assert!(s.begin_dirs().is_none());
        assert_eq!(s.dirs().len(), 1);
    }

    #[test]
    fn test_empty_file_listing_is_refetched() {
        let mut s = session(Epoch::default());
        let pending = s.begin_files("/src").unwrap();
        assert_eq!(pending.request.revision, 100);
        assert!(s.complete_files(pending, Vec::new()));
        assert!(s.begin_files("/src").is_some());
        assert!(s.files("/src").is_empty());
        assert!(s.files("/other").is_empty());
    }

    #[test]
    fn test_with_range_starts_empty() {
        let mut s = session(Epoch::default());
        let pending = s.begin_results(&[1], 5).unwrap();
        s.complete_results(pending, vec![raw(1, 5, 3.0)]).unwrap();
        s.set_sample_size(10);

        let narrowed = Session::with_range(Epoch::default().next(), &s, 10, 50, version(150, 50));
        assert_eq!(narrowed.range(), (10, 50));
        assert_eq!(narrowed.sample_size(), 10);
        assert_eq!(narrowed.selected_version(), version(150, 50));
        assert!(narrowed.results().is_empty());
        assert_eq!(narrowed.sampled_revisions().first(), Some(&10));
        assert_eq!(narrowed.sampled_revisions().last(), Some(&50));
    }
}
