//! End-to-end duplication on the filesystem host

use dirdup_core::prelude::*;
use dirdup_test_utils::{asset_referencing, prefab_referencing, AssetTree};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;

fn duplicator() -> Duplicator {
    Duplicator::new(
        DuplicatorConfig::new().with_max_concurrency(4),
        Arc::new(FsAssetHost::new()),
    )
    .unwrap()
}

/// Level/
///   Level.asset  (g-level)  → g-hero, g-ext
///   Hero/Hero.prefab (g-hero) → g-mat, g-mat, g-level
///   Hero/Hero.mat (g-mat)
///   Hero/Hero.png (g-png)
fn level(tree: &AssetTree) {
    tree.folder("Level", "g-folder");
    tree.folder("Level/Hero", "g-hero-folder");
    tree.asset(
        "Level/Level.asset",
        &prefab_referencing("Level", &["g-hero", "g-ext"]),
        "g-level",
    );
    tree.asset(
        "Level/Hero/Hero.prefab",
        &prefab_referencing("Hero", &["g-mat", "g-mat", "g-level"]),
        "g-hero",
    );
    tree.asset("Level/Hero/Hero.mat", &asset_referencing("Mat", "g-shader"), "g-mat");
    tree.asset("Level/Hero/Hero.png", "png bytes", "g-png");
}

#[tokio::test]
async fn duplicate_rewires_internal_references() {
    let tree = AssetTree::new();
    level(&tree);

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: ProgressSink = Arc::new(move |p| sink_seen.lock().push(p.completed));

    let target = tree.path("Level(copy)");
    let report = duplicator()
        .duplicate(&tree.path("Level"), &target, &[], Some(sink))
        .await
        .unwrap();

    assert_eq!(report.copy.files_copied, 4);
    assert_eq!(report.copy.sidecars_skipped, 5);
    // root, Hero folder, four files
    assert_eq!(report.identifiers_assigned, 6);
    // four files and the Hero folder
    assert_eq!(report.build.mapped, 5);
    assert_eq!(report.manifest.summary.rewritten, 2);
    assert_eq!(report.manifest.summary.unchanged, 1);
    assert_eq!(report.manifest.summary.references_replaced, 4);
    assert!(!report.has_failures());
    assert_eq!(*seen.lock(), vec![1, 2, 3]);

    let new_level = tree.guid_of("Level(copy)/Level.asset").unwrap();
    let new_hero = tree.guid_of("Level(copy)/Hero/Hero.prefab").unwrap();
    let new_mat = tree.guid_of("Level(copy)/Hero/Hero.mat").unwrap();
    assert_ne!(new_level, "g-level");
    assert_eq!(new_level.len(), 32);

    assert_eq!(
        tree.read("Level(copy)/Level.asset"),
        prefab_referencing("Level", &[new_hero.as_str(), "g-ext"])
    );
    assert_eq!(
        tree.read("Level(copy)/Hero/Hero.prefab"),
        prefab_referencing("Hero", &[new_mat.as_str(), new_mat.as_str(), new_level.as_str()])
    );
    // No internal references, left as copied
    assert_eq!(
        tree.read("Level(copy)/Hero/Hero.mat"),
        asset_referencing("Mat", "g-shader")
    );

    // Origin untouched
    assert_eq!(
        tree.read("Level/Level.asset"),
        prefab_referencing("Level", &["g-hero", "g-ext"])
    );
    assert_eq!(tree.guid_of("Level/Level.asset").as_deref(), Some("g-level"));
}

#[tokio::test]
async fn folder_references_follow_the_copy() {
    let tree = AssetTree::new();
    tree.folder("Level", "g-folder");
    tree.folder("Level/Sub", "g-sub-folder");
    tree.asset("Level/A.asset", &asset_referencing("A", "g-sub-folder"), "g-a");

    let report = duplicator()
        .duplicate(&tree.path("Level"), &tree.path("Level(copy)"), &[], None)
        .await
        .unwrap();

    let new_sub = tree.guid_of("Level(copy)/Sub").unwrap();
    assert_ne!(new_sub, "g-sub-folder");
    assert_eq!(report.build.mapped, 2);
    assert_eq!(report.manifest.summary.rewritten, 1);
    assert_eq!(
        tree.read("Level(copy)/A.asset"),
        asset_referencing("A", &new_sub)
    );
}

#[tokio::test]
async fn excluded_subtrees_keep_pointing_at_origin() {
    let tree = AssetTree::new();
    level(&tree);

    let target = tree.path("Level(copy)");
    let report = duplicator()
        .duplicate(&tree.path("Level"), &target, &[PathBuf::from("Hero")], None)
        .await
        .unwrap();

    assert_eq!(report.copy.files_copied, 1);
    assert!(!target.join("Hero").exists());
    // Level.asset is rewritten only if it references itself; it does not
    assert_eq!(report.manifest.summary.unchanged, 1);
    assert_eq!(
        tree.read("Level(copy)/Level.asset"),
        prefab_referencing("Level", &["g-hero", "g-ext"])
    );
}

#[tokio::test]
async fn default_destination_does_not_collide() {
    let tree = AssetTree::new();
    level(&tree);
    let duplicator = duplicator();

    let first = duplicator.default_destination(&tree.path("Level"));
    duplicator
        .duplicate(&tree.path("Level"), &first, &[], None)
        .await
        .unwrap();
    let second = duplicator.default_destination(&tree.path("Level"));
    assert_eq!(first, tree.path("Level(copy)"));
    assert_eq!(second, tree.path("Level(copy1)"));

    duplicator
        .duplicate(&tree.path("Level"), &second, &[], None)
        .await
        .unwrap();
    assert_ne!(
        tree.guid_of("Level(copy)/Level.asset"),
        tree.guid_of("Level(copy1)/Level.asset")
    );
}

#[tokio::test]
async fn remap_alone_works_on_a_host_copied_tree() {
    let tree = AssetTree::new();
    tree.asset("Origin/A.asset", &asset_referencing("A", "g2"), "g1");
    tree.asset("Origin/B.asset", &asset_referencing("B", "g1"), "g2");
    tree.asset("Copy/A.asset", &asset_referencing("A", "g2"), "n1");
    tree.asset("Copy/B.asset", &asset_referencing("B", "g1"), "n2");

    let report = duplicator()
        .remap(&tree.path("Origin"), &tree.path("Copy"), None)
        .await
        .unwrap();

    assert_eq!(report.build.mapped, 2);
    assert_eq!(report.manifest.summary.rewritten, 2);
    assert_eq!(tree.read("Copy/A.asset"), asset_referencing("A", "n2"));
    assert_eq!(tree.read("Copy/B.asset"), asset_referencing("B", "n1"));
}

#[tokio::test]
async fn report_serializes_to_json() {
    let tree = AssetTree::new();
    level(&tree);
    let report = duplicator()
        .duplicate(&tree.path("Level"), &tree.path("Out"), &[], None)
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["copy"]["files_copied"], 4);
    assert_eq!(json["manifest"]["summary"]["rewritten"], 2);
    assert_eq!(json["manifest"]["outcomes"].as_array().unwrap().len(), 3);
}
