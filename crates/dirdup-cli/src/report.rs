//! Human-readable and JSON report output

use dirdup_core::{
    BuildReport, DuplicationReport, OutcomeStatus, Progress, ProgressSink, RemapReport,
    RewriteManifest,
};
use std::fmt::Write as _;
use std::sync::Arc;

/// Progress sink logging roughly every tenth of the batch
pub(crate) fn progress_sink() -> ProgressSink {
    Arc::new(|progress: Progress| {
        let step = (progress.total / 10).max(1);
        if progress.completed % step == 0 || progress.is_complete() {
            tracing::info!("Rewriting documents {}", progress);
        } else {
            tracing::debug!("Rewriting documents {}", progress);
        }
    })
}

fn write_build(out: &mut String, build: &BuildReport) {
    let _ = writeln!(
        out,
        "Identifiers:  {} mapped from {} entries ({} without origin, {} unresolved, {} overwritten)",
        build.mapped,
        build.pairs_considered,
        build.skipped_missing_origin,
        build.skipped_unresolved,
        build.overwritten
    );
}

fn write_manifest(out: &mut String, manifest: &RewriteManifest) {
    let summary = &manifest.summary;
    let _ = writeln!(
        out,
        "Documents:    {} rewritten, {} unchanged, {} skipped, {} failed ({} references replaced)",
        summary.rewritten,
        summary.unchanged,
        summary.skipped,
        summary.failed,
        summary.references_replaced
    );
    for outcome in manifest.failures() {
        if let OutcomeStatus::Failed { error } = &outcome.status {
            let _ = writeln!(out, "  FAILED {}: {}", outcome.path.display(), error);
        }
    }
}

pub(crate) fn render_duplication(report: &DuplicationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Duplicated {} -> {}",
        report.origin.display(),
        report.target.display()
    );
    let _ = writeln!(
        out,
        "Copied:       {} files, {} directories ({} excluded)",
        report.copy.files_copied, report.copy.directories_created, report.copy.excluded
    );
    let _ = writeln!(out, "Assigned:     {} identifiers", report.identifiers_assigned);
    write_build(&mut out, &report.build);
    write_manifest(&mut out, &report.manifest);
    out
}

pub(crate) fn render_remap(report: &RemapReport) -> String {
    let mut out = String::new();
    write_build(&mut out, &report.build);
    write_manifest(&mut out, &report.manifest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirdup_core::{FileOutcome, RewriteError};
    use std::path::PathBuf;

    fn manifest() -> RewriteManifest {
        RewriteManifest::new(
            vec![
                FileOutcome {
                    path: PathBuf::from("A.asset"),
                    status: OutcomeStatus::Rewritten { replaced: 2 },
                },
                FileOutcome {
                    path: PathBuf::from("Bad.prefab"),
                    status: OutcomeStatus::Failed {
                        error: Arc::new(RewriteError::TaskAborted("boom".to_string())),
                    },
                },
            ],
            Progress {
                completed: 2,
                total: 2,
            },
        )
    }

    #[test]
    fn remap_summary_lists_failures() {
        let text = render_remap(&RemapReport {
            build: BuildReport {
                pairs_considered: 3,
                mapped: 2,
                ..BuildReport::default()
            },
            manifest: manifest(),
        });
        assert!(text.contains("2 mapped from 3 entries"));
        assert!(text.contains("1 rewritten"));
        assert!(text.contains("1 failed (2 references replaced)"));
        assert!(text.contains("FAILED Bad.prefab: task did not complete: boom"));
    }
}
