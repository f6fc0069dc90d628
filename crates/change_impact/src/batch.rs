//! Analysis of many file changes at once.
//!
//! Commits and the files inside them are independent: each file gets its own
//! analysis context, so they run in parallel on the rayon pool. A file that
//! fails is logged and reported as skipped; it never fails the batch.

use crate::{
    analysis::analyze_script,
    annotate::{annotate, Annotation},
    config::AnalysisOptions,
    error::AnalysisError,
};
use ast::Script;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Both versions of one changed file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// The version before the commit.
    pub src: Script,
    /// The version after the commit.
    pub dst: Script,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub src: Vec<Annotation>,
    pub dst: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    pub id: String,
    pub files: Vec<FileReport>,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub commit: String,
    pub path: String,
    pub stage: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub commits: Vec<CommitReport>,
    pub skipped: Vec<SkippedFile>,
}

/// Analyzes and annotates both versions of `change`.
pub fn analyze_file(
    change: &FileChange,
    options: &AnalysisOptions,
) -> Result<FileReport, AnalysisError> {
    let src = analyze_script(&change.src, options)?;
    let dst = analyze_script(&change.dst, options)?;
    Ok(FileReport {
        path: change.path.clone(),
        src: annotate(&change.src, &src),
        dst: annotate(&change.dst, &dst),
    })
}

pub fn analyze_commits(commits: &[Commit], options: &AnalysisOptions) -> BatchReport {
    let results: Vec<(CommitReport, Vec<SkippedFile>)> = commits
        .par_iter()
        .map(|commit| analyze_commit(commit, options))
        .collect();

    let mut report = BatchReport::default();
    for (commit, skipped) in results {
        report.commits.push(commit);
        report.skipped.extend(skipped);
    }
    debug!(
        commits = report.commits.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );
    report
}

fn analyze_commit(commit: &Commit, options: &AnalysisOptions) -> (CommitReport, Vec<SkippedFile>) {
    let outcomes: Vec<_> = commit
        .files
        .par_iter()
        .map(|file| (file, analyze_file(file, options)))
        .collect();

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(report) => files.push(report),
            Err(err) => {
                warn!(
                    commit = %commit.id,
                    path = %file.path,
                    stage = err.stage(),
                    "skipping file: {}",
                    err
                );
                skipped.push(SkippedFile {
                    commit: commit.id.clone(),
                    path: file.path.clone(),
                    stage: err.stage(),
                    error: err.to_string(),
                });
            }
        }
    }
    (
        CommitReport {
            id: commit.id.clone(),
            files,
        },
        skipped,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::builder::AstBuilder;
    use pretty_assertions::assert_eq;

    fn change(path: &str, empty_dst: bool) -> FileChange {
        let b = AstBuilder::new();
        let src = b.script(vec![b.var("a", Some(b.num(1.0)))]);
        let dst = if empty_dst {
            b.script(vec![])
        } else {
            b.script(vec![b.inserted(|| b.var("a", Some(b.num(2.0))))])
        };
        FileChange {
            path: path.to_string(),
            src,
            dst,
        }
    }

    #[test]
    fn test_failed_file_is_skipped() {
        let commits = vec![
            Commit {
                id: "c1".to_string(),
                files: vec![change("a.js", false), change("b.js", true)],
            },
            Commit {
                id: "c2".to_string(),
                files: vec![change("c.js", false)],
            },
        ];
        let report = analyze_commits(&commits, &AnalysisOptions::default());

        let analyzed: Vec<(&str, Vec<&str>)> = report
            .commits
            .iter()
            .map(|c| {
                (
                    c.id.as_str(),
                    c.files.iter().map(|f| f.path.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(analyzed, vec![("c1", vec!["a.js"]), ("c2", vec!["c.js"])]);
        assert_eq!(
            report.skipped,
            vec![SkippedFile {
                commit: "c1".to_string(),
                path: "b.js".to_string(),
                stage: "parse",
                error: "empty input".to_string(),
            }]
        );
    }

    #[test]
    fn test_file_report_annotates_both_versions() {
        let report = match analyze_file(&change("a.js", false), &AnalysisOptions::default()) {
            Ok(report) => report,
            Err(err) => panic!("analysis failed: {}", err),
        };
        assert!(report.src.iter().all(|a| a.label != crate::annotate::ENV_DEF));
        assert!(report
            .dst
            .iter()
            .any(|a| a.label == crate::annotate::ENV_DEF));
    }
}
