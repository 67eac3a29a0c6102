// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid result record: missing or malformed `{field}`")]
    InvalidRecord { field: &'static str },

    #[error("backend request failed: {context}")]
    Backend {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("no project selected")]
    NoProjectSelected,

    #[error("revision range {min}-{max} is outside {first}-{latest}")]
    RangeOutOfBounds {
        min: u64,
        max: u64,
        first: u64,
        latest: u64,
    },

    #[error("backend has no version for revision {0}")]
    UnknownRevision(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
