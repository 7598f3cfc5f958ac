#![allow(dead_code)]

use chrono::NaiveDate;
use reading_list_import::domain::model::{Issue, IssueId, User};
use reading_list_import::{JsonFileStore, StoreSnapshot};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn issue(id: IssueId, cv_id: Option<i64>, series: &str, number: &str) -> Issue {
    Issue {
        id,
        cv_id,
        series_id: 1,
        series_name: series.to_string(),
        number: number.to_string(),
        cover_date: NaiveDate::from_ymd_opt(2006, 5, 1),
        arc_ids: vec![],
    }
}

/// 建立含有兩位使用者與 Civil War 期刊的儲存檔
pub fn seeded_store(dir: &TempDir) -> anyhow::Result<PathBuf> {
    let snapshot = StoreSnapshot {
        users: vec![
            User {
                id: 1,
                username: "Metron".to_string(),
            },
            User {
                id: 2,
                username: "reader".to_string(),
            },
        ],
        issues: vec![
            issue(1, Some(105837), "Civil War", "1"),
            issue(2, Some(106305), "Civil War", "2"),
            issue(3, None, "Amazing Spider-Man", "532"),
            issue(4, Some(107000), "Civil War", "3"),
        ],
        ..StoreSnapshot::default()
    };

    let path = dir.path().join("store.json");
    JsonFileStore::create(&path, snapshot)?;
    Ok(path)
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

pub fn reopen(path: &Path) -> anyhow::Result<JsonFileStore> {
    Ok(JsonFileStore::open(path)?)
}
