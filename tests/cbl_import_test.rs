mod common;

use common::{reopen, seeded_store, write_file};
use reading_list_import::core::importer::{import_cbl_file, CblImportOptions};
use reading_list_import::domain::model::AttributionSource;
use reading_list_import::domain::ports::{ReadingListStore, UserDirectory};
use reading_list_import::ReadingListError;
use tempfile::TempDir;

const CIVIL_WAR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ReadingList xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Name>Civil War</Name>
  <NumIssues>6</NumIssues>
  <Books>
    <Book Series="Civil War" Number="1" Volume="2006" Year="2006">
      <Database Name="cv" Series="18023" Issue="105837" />
    </Book>
    <Book Series="Amazing Spider-Man" Number="532" Volume="1999" Year="2006">
      <Database Name="Metron" Series="1" Issue="3" />
    </Book>
    <Book Series="Civil War" Number="2" Volume="2006" Year="2006">
      <Database Name="cv" Series="18023" Issue="106305" />
    </Book>
    <Book Series="Civil War: Front Line" Number="1" Volume="2006" Year="2006">
      <Database Name="cv" Series="18024" Issue="999999" />
    </Book>
    <Book Series="Civil War" Number="3" Volume="2006" Year="2006">
      <Database Name="gcd" Series="1" Issue="77" />
    </Book>
    <Book Series="Civil War" Number="1" Volume="2006" Year="2006">
      <Database Name="cv" Series="18023" Issue="105837" />
    </Book>
  </Books>
</ReadingList>"#;

#[test]
fn test_cbl_import_is_persisted_in_document_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let cbl = write_file(&dir, "civil-war.cbl", CIVIL_WAR)?;

    let mut store = reopen(&store_path)?;
    let owner = store.find_user_by_username("reader")?.expect("seeded user");
    let options = CblImportOptions {
        is_private: true,
        attribution_source: Some(AttributionSource::Cbro),
        attribution_url: "https://comicbookreadingorders.com/marvel/events/civil-war/".to_string(),
    };
    let result = import_cbl_file(&mut store, &cbl, &owner, &options)?;

    assert_eq!(result.issues_added, 3);
    assert_eq!(result.issues_not_found.len(), 1);
    assert_eq!(result.issues_not_found[0].database_issue_id, "999999");
    assert_eq!(result.issues_skipped.len(), 2);
    assert!(result.reading_list.is_private);
    assert_eq!(result.reading_list.slug, "civil-war");

    // 重新開啟檔案確認已寫回
    let reopened = reopen(&store_path)?;
    let list = reopened
        .find_list(owner.id, "Civil War")?
        .expect("list was persisted");
    assert_eq!(list.attribution_source, Some(AttributionSource::Cbro));

    let items: Vec<(i64, i64)> = reopened
        .list_items(list.id)?
        .iter()
        .map(|item| (item.issue_id, item.order))
        .collect();
    assert_eq!(items, vec![(1, 1), (3, 2), (2, 3)]);
    Ok(())
}

#[test]
fn test_importing_same_cbl_twice_fails_without_new_rows() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let cbl = write_file(&dir, "civil-war.cbl", CIVIL_WAR)?;

    let mut store = reopen(&store_path)?;
    let owner = store.find_user_by_username("reader")?.expect("seeded user");
    import_cbl_file(&mut store, &cbl, &owner, &CblImportOptions::default())?;
    let before = store.snapshot().clone();

    let err = import_cbl_file(&mut store, &cbl, &owner, &CblImportOptions::default())
        .expect_err("second import must fail");
    assert!(matches!(err, ReadingListError::DuplicateListError { .. }));
    assert!(err.is_import_error());
    assert_eq!(store.snapshot(), &before);
    Ok(())
}

#[test]
fn test_same_name_for_different_owners_gets_unique_slugs() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let cbl = write_file(&dir, "civil-war.cbl", CIVIL_WAR)?;

    let mut store = reopen(&store_path)?;
    let reader = store.find_user_by_username("reader")?.expect("seeded user");
    let metron = store.find_user_by_username("Metron")?.expect("seeded user");

    let first = import_cbl_file(&mut store, &cbl, &reader, &CblImportOptions::default())?;
    let second = import_cbl_file(&mut store, &cbl, &metron, &CblImportOptions::default())?;

    assert_eq!(first.reading_list.slug, "civil-war");
    assert_eq!(second.reading_list.slug, "civil-war-1");
    Ok(())
}

#[test]
fn test_list_is_created_even_when_nothing_resolves() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let cbl = write_file(
        &dir,
        "unknown.cbl",
        r#"<ReadingList><Name>Unknown Event</Name><Books>
             <Book Series="Nope" Number="1"><Database Name="cv" Issue="1" /></Book>
             <Book Series="Nope" Number="2"><Database Name="cv" Issue="abc" /></Book>
           </Books></ReadingList>"#,
    )?;

    let mut store = reopen(&store_path)?;
    let owner = store.find_user_by_username("reader")?.expect("seeded user");
    let result = import_cbl_file(&mut store, &cbl, &owner, &CblImportOptions::default())?;

    assert_eq!(result.issues_added, 0);
    assert_eq!(result.issues_not_found.len(), 1);
    assert_eq!(result.issues_skipped.len(), 1);
    assert!(store.find_list(owner.id, "Unknown Event")?.is_some());
    Ok(())
}

#[test]
fn test_parse_failures_write_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let wrong_extension = write_file(&dir, "civil-war.xml", CIVIL_WAR)?;
    let malformed = write_file(&dir, "broken.cbl", "<ReadingList><Name>Broken</Name>")?;

    let mut store = reopen(&store_path)?;
    let owner = store.find_user_by_username("reader")?.expect("seeded user");

    for path in [wrong_extension, malformed, dir.path().join("missing.cbl")] {
        let err = import_cbl_file(&mut store, &path, &owner, &CblImportOptions::default())
            .expect_err("import must fail");
        assert!(err.is_parse_error(), "unexpected error: {}", err);
    }

    assert!(store.snapshot().reading_lists.is_empty());
    Ok(())
}

#[test]
fn test_invalid_attribution_url_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store_path = seeded_store(&dir)?;
    let cbl = write_file(&dir, "civil-war.cbl", CIVIL_WAR)?;

    let mut store = reopen(&store_path)?;
    let owner = store.find_user_by_username("reader")?.expect("seeded user");
    let options = CblImportOptions {
        attribution_url: "ftp://example.com/list".to_string(),
        ..CblImportOptions::default()
    };

    assert!(import_cbl_file(&mut store, &cbl, &owner, &options).is_err());
    assert!(store.snapshot().reading_lists.is_empty());
    Ok(())
}
