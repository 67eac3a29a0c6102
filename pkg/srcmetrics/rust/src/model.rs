// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! JSON shapes served by the metrics backend proxy.
//!
//! The proxy wraps every entity in a single-key object (`{"project": {...}}`,
//! `{"version": {...}}`, ...). The `*Entry` types mirror that envelope and are
//! unwrapped by the backend before anything reaches the caches.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Error, Result};

/// Identifier of a resource (project version or file) results are recorded against.
pub type ResourceId = u64;
pub type MetricId = u64;
/// Monotonically increasing identifier of a project version snapshot.
pub type Revision = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectEntry {
    pub project: Project,
}

/// A project version: the backend's internal id plus its revision number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: ResourceId,
    pub revision_id: Revision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionEntry {
    pub version: Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    SourceFile,
    SourceDirectory,
    ProjectVersion,
}

impl MetricType {
    pub const ALL: [MetricType; 3] = [
        MetricType::SourceFile,
        MetricType::SourceDirectory,
        MetricType::ProjectVersion,
    ];

    /// Name used by the proxy's `/metrics/by-type/` endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::SourceFile => "SOURCE_FILE",
            MetricType::SourceDirectory => "SOURCE_DIRECTORY",
            MetricType::ProjectVersion => "PROJECT_VERSION",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOURCE_FILE" | "FILE" => Ok(MetricType::SourceFile),
            "SOURCE_DIRECTORY" | "DIR" | "DIRECTORY" => Ok(MetricType::SourceDirectory),
            "PROJECT_VERSION" | "VERSION" => Ok(MetricType::ProjectVersion),
            _ => Err(format!(
                "unknown metric type: {s}, expected SOURCE_FILE, SOURCE_DIRECTORY or PROJECT_VERSION"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub mnemonic: String,
    #[serde(default)]
    pub description: String,
}

impl Metric {
    /// Selector label, `MNEMONIC | description`.
    pub fn label(&self) -> String {
        format!("{} | {}", self.mnemonic, self.description)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricEntry {
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dir {
    pub path: String,
}

/// A file or directory in a project version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: ResourceId,
    pub name: String,
    pub dir: Dir,
}

impl SourceFile {
    pub fn path(&self) -> String {
        if self.dir.path == "/" {
            format!("/{}", self.name)
        } else {
            format!("{}/{}", self.dir.path, self.name)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileEntry {
    pub file: SourceFile,
}

/// A metric measurement for one resource. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRecord {
    pub resource_id: ResourceId,
    pub metric_id: MetricId,
    pub value: f64,
}

/// Result record as sent by the proxy. Every field is optional on the wire;
/// conversion into [`ResultRecord`] rejects incomplete records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    pub artifact_id: Option<ResourceId>,
    pub metric_id: Option<MetricId>,
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultEntry {
    pub r: RawResult,
}

impl TryFrom<RawResult> for ResultRecord {
    type Error = Error;

    fn try_from(raw: RawResult) -> Result<Self> {
        let resource_id = raw.artifact_id.ok_or(Error::InvalidRecord {
            field: "artifactId",
        })?;
        let metric_id = raw
            .metric_id
            .ok_or(Error::InvalidRecord { field: "metricId" })?;
        let value = match raw.result {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            // Some metrics report their value as a string
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or(Error::InvalidRecord { field: "result" })?;

        Ok(ResultRecord {
            resource_id,
            metric_id,
            value,
        })
    }
}
