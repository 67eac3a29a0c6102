// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Client for a project source-metrics backend proxy.
//!
//! Fetches projects, versions, directories, files and metric results over the
//! proxy's JSON API, caches them per selection and assembles dashboard views:
//!
//! - `sampler` - picks evenly spaced revisions from a version range
//! - `cache` - result and version caches with last-write-wins lookup
//! - `session` - per-selection state with epoch-stamped fetches
//! - `dashboard` - version plots and directory/file metric tables
//! - `backend` - the proxy API as a trait, plus its HTTP implementation

pub mod backend;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod model;
pub mod render;
pub mod sampler;
pub mod session;

pub use backend::{Backend, HttpBackend};
pub use cache::{ResultCache, VersionCache};
pub use dashboard::{Dashboard, MetricTable, VersionPlot};
pub use errors::{Error, Result};
pub use session::{Epoch, Session};
