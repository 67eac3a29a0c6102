// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::model::Revision;

/// Pick about `count + 1` evenly spaced revisions from `min..=max`.
///
/// Ranges no wider than `count` are returned whole. Otherwise revisions are
/// taken every `(max - min) / count` steps starting at `min`, rounded down.
/// The output is strictly increasing and always ends on `max` when the range
/// is non-empty.
pub fn sample(count: usize, min: Revision, max: Revision) -> Vec<Revision> {
    if min > max {
        return Vec::new();
    }

    let span = max - min;
    if span <= count as u64 {
        return (min..=max).collect();
    }

    // span > count, so count == 0 means an infinite step
    if count == 0 {
        return vec![min];
    }

    // floor(min + i * span / count) in exact arithmetic, so the walk ends on
    // `max` and never repeats a revision (the step is wider than one)
    let count = count as u128;
    (0..=count)
        .map(|i| min + (u128::from(span) * i / count) as Revision)
        .collect()
}
