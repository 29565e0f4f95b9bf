//! File-backed template store against a temporary directory.

use opm_report::template::defaults::{DEFAULT_MONTHLY_ID, DEFAULT_WEEKLY_ID};
use opm_report::{FileTemplateStore, ReportError, ReportTemplate};
use serde_json::json;
use tempfile::TempDir;

fn doc(title: &str) -> ReportTemplate {
    ReportTemplate::from_value(json!({
        "template_info": {"name": "Custom", "type": "custom", "description": "test"},
        "title_template": title,
        "sections": [{"section_id": "s1", "section_name": "S1", "order": 1, "content_template": "hello"}]
    }))
    .unwrap()
}

#[test]
fn ensure_defaults_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path().join("templates"));
    assert_eq!(store.ensure_defaults().unwrap(), 2);
    assert_eq!(store.ensure_defaults().unwrap(), 0);

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![DEFAULT_MONTHLY_ID, DEFAULT_WEEKLY_ID]);
}

#[test]
fn defaults_skipped_when_any_template_exists() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());
    store.save("mine", &doc("Mine")).unwrap();
    assert_eq!(store.ensure_defaults().unwrap(), 0);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn save_get_overwrite_delete() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());

    let saved = store.save("team", &doc("v1")).unwrap();
    assert!(saved.template_info.updated_at.is_some());
    assert_eq!(store.get("team").unwrap().title_template, "v1");

    store.save("team", &doc("v2")).unwrap();
    assert_eq!(store.get("team").unwrap().title_template, "v2");
    assert!(dir.path().join("team.yaml").is_file());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());

    assert!(store.delete("team").unwrap());
    assert!(!store.delete("team").unwrap());
    assert!(matches!(store.get("team"), Err(ReportError::TemplateNotFound(_))));
}

fn temp_files(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(".tmp."))
        .collect()
}

#[test]
fn concurrent_saves_of_one_id_all_succeed() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || store.save("shared", &doc(&format!("v{i}"))))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let title = store.get("shared").unwrap().title_template;
    assert!(title.starts_with('v'), "{title}");
    assert!(temp_files(dir.path()).is_empty());
}

#[test]
fn failed_save_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());
    // A directory in the target's place makes the final rename fail.
    std::fs::create_dir(dir.path().join("blocked.yaml")).unwrap();

    assert!(matches!(store.save("blocked", &doc("x")), Err(ReportError::Io(_))));
    assert!(temp_files(dir.path()).is_empty());
}

#[test]
fn unreadable_files_are_skipped_in_listing() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());
    store.save("good", &doc("ok")).unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "title_template: [unclosed").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["good"]);
    assert!(matches!(store.get("broken"), Err(ReportError::Yaml { .. })));
}

#[test]
fn invalid_ids_and_documents_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path());
    assert!(matches!(
        store.save("../escape", &doc("x")),
        Err(ReportError::InvalidTemplate(_))
    ));

    let mut empty = doc("x");
    empty.sections.clear();
    assert!(matches!(store.save("empty", &empty), Err(ReportError::InvalidTemplate(_))));
    assert!(!store.exists("empty"));
}

#[test]
fn missing_directory_lists_nothing() {
    let dir = TempDir::new().unwrap();
    let store = FileTemplateStore::new(dir.path().join("nope"));
    assert!(store.list().unwrap().is_empty());
}
