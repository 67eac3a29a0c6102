// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Client-side caches for backend responses.
//!
//! Neither cache evicts or expires entries. They belong to a
//! [`Session`](crate::session::Session) and are dropped with it when the user
//! selects another project or version range.

use std::collections::HashMap;

use crate::model::{MetricId, ResourceId, ResultRecord, Revision, Version};

/// Metric results indexed by resource, then metric.
#[derive(Debug, Default)]
pub struct ResultCache {
    /// resource -> records in fetch order
    by_resource: HashMap<ResourceId, Vec<ResultRecord>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently recorded result for `(resource_id, metric_id)`.
    pub fn lookup(&self, resource_id: ResourceId, metric_id: MetricId) -> Option<&ResultRecord> {
        self.by_resource
            .get(&resource_id)?
            .iter()
            .rev()
            .find(|r| r.metric_id == metric_id)
    }

    /// Append records to their resource's list. Repeated pairs are kept;
    /// [`lookup`](Self::lookup) returns the last one.
    pub fn record_batch<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        for record in records {
            self.by_resource
                .entry(record.resource_id)
                .or_default()
                .push(record);
        }
    }

    /// Ids from `requested` that have no cached result for `metric_id`, in
    /// request order.
    pub fn pending_resource_ids(
        &self,
        requested: &[ResourceId],
        metric_id: MetricId,
    ) -> Vec<ResourceId> {
        requested
            .iter()
            .copied()
            .filter(|&id| self.lookup(id, metric_id).is_none())
            .collect()
    }

    /// Number of records held, duplicates included.
    pub fn len(&self) -> usize {
        self.by_resource.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }
}

/// Version descriptors indexed by revision.
#[derive(Debug, Default)]
pub struct VersionCache {
    by_revision: HashMap<Revision, Version>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_batch<I>(&mut self, versions: I)
    where
        I: IntoIterator<Item = Version>,
    {
        for version in versions {
            self.by_revision.insert(version.revision_id, version);
        }
    }

    pub fn get(&self, revision: Revision) -> Option<&Version> {
        self.by_revision.get(&revision)
    }

    pub fn version_id(&self, revision: Revision) -> Option<ResourceId> {
        self.get(revision).map(|v| v.id)
    }

    pub fn pending_revisions(&self, requested: &[Revision]) -> Vec<Revision> {
        requested
            .iter()
            .copied()
            .filter(|rev| !self.by_revision.contains_key(rev))
            .collect()
    }

    /// `(revision, version id)` for every requested revision the backend
    /// knows about. Unknown revisions are skipped.
    pub fn resolve(&self, revisions: &[Revision]) -> Vec<(Revision, ResourceId)> {
        revisions
            .iter()
            .filter_map(|&rev| self.version_id(rev).map(|id| (rev, id)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_revision.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_revision.is_empty()
    }
}
