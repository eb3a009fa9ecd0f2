mod common;

use anyhow::Result;
use common::TestSite;
use patman::manifest::{EventOutcome, PatternEntry, PatternEvent, default_folders};

fn added(path: &str) -> PatternEvent {
    PatternEvent::Added {
        path: path.to_string(),
    }
}

fn changed(path: &str) -> PatternEvent {
    PatternEvent::Changed {
        path: path.to_string(),
    }
}

fn deleted(path: &str) -> PatternEvent {
    PatternEvent::Deleted {
        path: path.to_string(),
    }
}

fn renamed(old: &str, path: &str) -> PatternEvent {
    PatternEvent::Renamed {
        old: old.to_string(),
        path: path.to_string(),
    }
}

#[test]
fn test_add_add_rename_scenario() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    store.apply(&added("molecules/card.hbs"))?;
    store.apply(&added("atoms/button.hbs"))?;
    store.apply(&renamed("atoms/button.hbs", "atoms/btn.hbs"))?;

    let manifest = site.read_manifest()?;
    assert_eq!(
        manifest.patterns,
        vec![
            PatternEntry {
                title: "btn".to_string(),
                description: String::new(),
                filename: "btn".to_string(),
                filepath: "atoms/btn.hbs".to_string(),
                deleted: None,
            },
            PatternEntry {
                title: "card".to_string(),
                description: String::new(),
                filename: "card".to_string(),
                filepath: "molecules/card.hbs".to_string(),
                deleted: None,
            },
        ]
    );
    assert_eq!(manifest.folder, default_folders());
    assert_eq!(site.trigger_count(), 3);
    Ok(())
}

#[test]
fn test_manifest_file_shape() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();
    store.apply(&added("atoms/button.hbs"))?;

    let text = site.manifest_text()?;
    assert!(text.ends_with('\n'));
    assert!(text.starts_with("{\n  \"patterns\": ["));

    let value: serde_json::Value = serde_json::from_str(&text)?;
    let entry = &value["patterns"][0];
    assert_eq!(entry["title"], "button");
    assert_eq!(entry["description"], "");
    assert_eq!(entry["filename"], "button");
    assert_eq!(entry["filepath"], "atoms/button.hbs");
    assert!(entry.get("deleted").is_none());
    assert_eq!(value["folder"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[test]
fn test_soft_delete_round_trip() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    store.apply(&added("atoms/button.hbs"))?;
    store.apply(&deleted("atoms/button.hbs"))?;

    let manifest = site.read_manifest()?;
    assert_eq!(manifest.patterns.len(), 1);
    assert_eq!(manifest.patterns[0].filepath, "atoms/button.hbs");
    assert_eq!(manifest.patterns[0].deleted, Some(true));

    store.apply(&renamed("atoms/button.hbs", "atoms/btn.hbs"))?;

    let manifest = site.read_manifest()?;
    assert_eq!(manifest.patterns.len(), 1);
    assert_eq!(manifest.patterns[0].filepath, "atoms/btn.hbs");
    assert!(!manifest.patterns[0].is_deleted());
    Ok(())
}

#[test]
fn test_readding_is_idempotent() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    assert_eq!(
        store.apply(&added("atoms/button.hbs"))?,
        EventOutcome::Persisted
    );
    let before = site.manifest_text()?;

    assert_eq!(
        store.apply(&added("atoms/button.hbs"))?,
        EventOutcome::Recompiled
    );
    assert_eq!(site.manifest_text()?, before);
    assert_eq!(store.patterns().len(), 1);
    assert_eq!(site.trigger_count(), 2);
    Ok(())
}

#[test]
fn test_backslash_paths_normalized() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    store.apply(&added("atoms\\button.hbs"))?;

    assert_eq!(site.read_manifest()?.patterns[0].filepath, "atoms/button.hbs");
    Ok(())
}

#[test]
fn test_dot_segments_resolve_to_one_entry() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    assert_eq!(
        store.apply(&added("atoms/button.hbs"))?,
        EventOutcome::Persisted
    );
    assert_eq!(
        store.apply(&added("atoms/./button.hbs"))?,
        EventOutcome::Recompiled
    );
    assert_eq!(
        store.apply(&changed("atoms/nested/../button.hbs"))?,
        EventOutcome::Recompiled
    );

    let manifest = site.read_manifest()?;
    assert_eq!(manifest.patterns.len(), 1);
    assert_eq!(manifest.patterns[0].filepath, "atoms/button.hbs");
    Ok(())
}

#[test]
fn test_parent_escape_rejected() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    assert!(store.apply(&added("../escape.hbs")).is_err());
    assert!(store.apply(&added("atoms/../../escape.hbs")).is_err());
    assert!(!site.ctx.manifest_path().exists());
    Ok(())
}

#[test]
fn test_absolute_paths_relativized() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();
    let absolute = site.write_pattern("pages/home.hbs")?;

    store.apply(&added(&absolute.to_string_lossy()))?;

    assert_eq!(site.read_manifest()?.patterns[0].filepath, "pages/home.hbs");
    Ok(())
}

#[test]
fn test_directory_change_leaves_file_untouched() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();
    store.apply(&added("atoms/button.hbs"))?;
    std::fs::create_dir_all(site.root().join("atoms"))?;

    let before = site.manifest_text()?;
    let triggers = site.trigger_count();

    assert_eq!(store.apply(&changed("atoms"))?, EventOutcome::Ignored);
    assert_eq!(store.apply(&added("atoms"))?, EventOutcome::Ignored);

    assert_eq!(site.manifest_text()?, before);
    assert_eq!(site.trigger_count(), triggers);
    Ok(())
}

#[test]
fn test_changed_unknown_path_is_added() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    assert_eq!(
        store.apply(&changed("organism/header.hbs"))?,
        EventOutcome::Persisted
    );
    assert_eq!(site.read_manifest()?.patterns.len(), 1);
    Ok(())
}

#[test]
fn test_unmatched_delete_and_rename_are_noops() -> Result<()> {
    let site = TestSite::new()?;
    let mut store = site.open_store();

    assert_eq!(
        store.apply(&deleted("atoms/ghost.hbs"))?,
        EventOutcome::Unmatched
    );
    assert_eq!(
        store.apply(&renamed("atoms/ghost.hbs", "atoms/spirit.hbs"))?,
        EventOutcome::Unmatched
    );
    assert!(!site.ctx.manifest_path().exists());
    assert_eq!(site.trigger_count(), 0);
    Ok(())
}

#[test]
fn test_state_survives_reload() -> Result<()> {
    let site = TestSite::new()?;
    {
        let mut store = site.open_store();
        store.apply(&added("atoms/button.hbs"))?;
        store.apply(&added("atoms/link.hbs"))?;
        store.apply(&deleted("atoms/link.hbs"))?;
    }

    let store = site.open_store();
    assert_eq!(store.baseline(), 2);
    assert_eq!(store.live_patterns().count(), 1);
    Ok(())
}

#[test]
fn test_corrupt_manifest_starts_fresh() -> Result<()> {
    let site = TestSite::new()?;
    std::fs::write(site.ctx.manifest_path(), "{ not json")?;

    let mut store = site.open_store();
    assert_eq!(store.baseline(), 0);
    assert_eq!(store.manifest().folder, default_folders());

    store.apply(&added("atoms/button.hbs"))?;
    assert_eq!(site.read_manifest()?.patterns.len(), 1);
    Ok(())
}

#[test]
fn test_bulk_scan_from_disk() -> Result<()> {
    let site = TestSite::new()?;
    site.write_pattern("templates/article.hbs")?;
    site.write_pattern("atoms/button.hbs")?;
    site.write_pattern("atoms/_partial.hbs")?;

    let mut store = site.open_store();
    let paths = site.ctx.scanner()?.scan()?;
    let report = store.bulk_scan(paths);

    assert_eq!(report.before, 0);
    assert_eq!(report.added, 2);
    assert!(report.written);

    let filepaths: Vec<_> = site
        .read_manifest()?
        .patterns
        .into_iter()
        .map(|e| e.filepath)
        .collect();
    assert_eq!(filepaths, vec!["atoms/button.hbs", "templates/article.hbs"]);
    assert_eq!(site.trigger_count(), 1);
    Ok(())
}

#[test]
fn test_bulk_scan_keeps_tombstones_and_descriptions() -> Result<()> {
    let site = TestSite::new()?;
    {
        let mut store = site.open_store();
        store.apply(&added("atoms/button.hbs"))?;
        store.apply(&added("atoms/old.hbs"))?;
        store.apply(&deleted("atoms/old.hbs"))?;
    }

    // Hand-edited description must survive a rebuild
    let mut manifest = site.read_manifest()?;
    manifest.patterns[0].description = "Primary call to action".to_string();
    std::fs::write(site.ctx.manifest_path(), manifest.to_json()?)?;

    site.write_pattern("atoms/button.hbs")?;
    site.write_pattern("atoms/old.hbs")?;

    let mut store = site.open_store();
    let report = store.bulk_scan(site.ctx.scanner()?.scan()?);

    assert_eq!(report.duplicates, 2);
    assert_eq!(report.added, 0);

    let manifest = site.read_manifest()?;
    assert_eq!(manifest.patterns[0].description, "Primary call to action");
    assert!(manifest.patterns[1].is_deleted());
    Ok(())
}
