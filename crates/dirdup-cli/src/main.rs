//! `dirdup` - duplicate an asset directory with identifier remapping
//!
//! Exit codes: 0 on success, 1 when any document failed to rewrite,
//! 2 when the operation itself could not run.

mod cli;
mod logging;
mod report;

use anyhow::Context;
use cli::{Action, GlobalArgs, Invocation};
use dirdup_core::{Duplicator, DuplicatorConfig, FsAssetHost};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    let Some(invocation) = Invocation::from_matches(&matches) else {
        eprintln!("error: unknown subcommand");
        return ExitCode::from(2);
    };

    let log_config = logging::LogConfig::from_verbosity(
        invocation.global.verbose,
        invocation.global.log_json,
    );
    if let Err(e) = logging::init(log_config) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(invocation).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn load_config(global: &GlobalArgs) -> anyhow::Result<DuplicatorConfig> {
    let mut config = match &global.config {
        Some(path) => DuplicatorConfig::from_yaml_file(path)?,
        None => DuplicatorConfig::default(),
    };
    if let Some(jobs) = global.jobs {
        config = config.with_max_concurrency(jobs);
    }
    config.validate()?;
    Ok(config)
}

/// Run one invocation; returns true when any document failed
async fn run(invocation: Invocation) -> anyhow::Result<bool> {
    let config = load_config(&invocation.global).context("invalid configuration")?;
    let host = FsAssetHost::new().with_sidecar_extension(config.sidecar_extension.clone());
    let duplicator = Duplicator::new(config, Arc::new(host))?;
    let json = invocation.global.json;

    let failed = match invocation.action {
        Action::Duplicate {
            origin,
            target,
            excludes,
        } => {
            let target = target.unwrap_or_else(|| duplicator.default_destination(&origin));
            let report = duplicator
                .duplicate(&origin, &target, &excludes, Some(report::progress_sink()))
                .await
                .with_context(|| format!("cannot duplicate {}", origin.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::render_duplication(&report));
            }
            report.has_failures()
        }
        Action::Remap { origin, duplicate } => {
            let report = duplicator
                .remap(&origin, &duplicate, Some(report::progress_sink()))
                .await
                .with_context(|| {
                    format!("cannot remap {} onto {}", origin.display(), duplicate.display())
                })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::render_remap(&report));
            }
            report.manifest.has_failures()
        }
    };

    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirdup_test_utils::{asset_referencing, AssetTree};
    use std::path::PathBuf;

    #[test]
    fn jobs_flag_overrides_config_file() {
        let tree = AssetTree::new();
        let path = tree.file("dirdup.yaml", "max_concurrency: 9\nreference_key: assetGuid\n");
        let config = load_config(&GlobalArgs {
            config: Some(path),
            jobs: Some(2),
            ..GlobalArgs::default()
        })
        .unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.reference_key, "assetGuid");
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let result = load_config(&GlobalArgs {
            jobs: Some(0),
            ..GlobalArgs::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn duplicate_action_succeeds_on_clean_tree() {
        let tree = AssetTree::new();
        tree.folder("Level", "g-folder");
        tree.asset("Level/A.asset", &asset_referencing("A", "g-b"), "g-a");
        tree.asset("Level/B.asset", &asset_referencing("B", "g-a"), "g-b");

        let failed = run(Invocation {
            global: GlobalArgs::default(),
            action: Action::Duplicate {
                origin: tree.path("Level"),
                target: None,
                excludes: Vec::<PathBuf>::new(),
            },
        })
        .await
        .unwrap();

        assert!(!failed);
        let new_b = tree.guid_of("Level(copy)/B.asset").unwrap();
        assert_eq!(tree.read("Level(copy)/A.asset"), asset_referencing("A", &new_b));
    }

    #[tokio::test]
    async fn missing_origin_is_an_error() {
        let tree = AssetTree::new();
        let result = run(Invocation {
            global: GlobalArgs::default(),
            action: Action::Remap {
                origin: tree.path("Nope"),
                duplicate: tree.path("Also"),
            },
        })
        .await;
        assert!(result.is_err());
    }
}
