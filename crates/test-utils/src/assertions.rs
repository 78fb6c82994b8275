// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Candidate list assertions
//!
//! Label comparisons are case-insensitive, matching how candidates are filtered.

fn contains(labels: &[String], wanted: &str) -> bool {
    labels.iter().any(|l| l.eq_ignore_ascii_case(wanted))
}

fn collect<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels.into_iter().map(|l| l.as_ref().to_string()).collect()
}

/// Assert that every expected label is present
pub fn assert_labels_include<I, S>(labels: I, expected: &[&str])
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = collect(labels);
    for wanted in expected {
        assert!(contains(&labels, wanted), "missing '{}' in {:?}", wanted, labels);
    }
}

/// Assert that none of the given labels is present
pub fn assert_labels_exclude<I, S>(labels: I, unexpected: &[&str])
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = collect(labels);
    for unwanted in unexpected {
        assert!(!contains(&labels, unwanted), "unexpected '{}' in {:?}", unwanted, labels);
    }
}
