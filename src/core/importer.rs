//! Import orchestration shared by the CBL upload path and the administrator
//! JSON batch path.
//!
//! Both paths resolve every descriptor first (read-only lookups), then write
//! the list and its items inside one store transaction. They differ only in
//! their [`ImportPolicy`]: the CBL path reports unresolved books and always
//! creates the list, the batch path refuses to create a list with missing
//! issues unless told to drop them.

use crate::core::cbl_parser::parse_cbl_file;
use crate::core::resolver::IssueResolver;
use crate::domain::model::{
    AttributionSource, BookDescriptor, CblData, ImportResult, Issue, IssueId, NewReadingList,
    ReadingList, Resolution, User,
};
use crate::domain::ports::{CatalogLookup, ReadingListStore};
use crate::utils::error::{ReadingListError, Result};
use crate::utils::validation::validate_attribution_url;
use std::collections::HashSet;
use std::path::Path;

pub const DUPLICATE_ISSUE_REASON: &str = "Issue already in reading list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingIssues {
    /// 記錄在報告中，清單照常建立
    Report,
    /// 整個檔案中止，不建立清單
    Abort,
    /// 略過無法對應的書目並回報數量
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingList {
    Fail,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportPolicy {
    pub missing: MissingIssues,
    pub existing_list: ExistingList,
    pub dry_run: bool,
}

impl ImportPolicy {
    /// CBL 上傳：重名即失敗，其餘問題只回報
    pub fn forgiving() -> Self {
        Self {
            missing: MissingIssues::Report,
            existing_list: ExistingList::Fail,
            dry_run: false,
        }
    }

    /// 管理者批次匯入：缺少期刊預設中止整個檔案
    pub fn strict(skip_missing: bool, dry_run: bool) -> Self {
        Self {
            missing: if skip_missing {
                MissingIssues::Drop
            } else {
                MissingIssues::Abort
            },
            existing_list: ExistingList::Skip,
            dry_run,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub name: String,
    pub owner: User,
    pub is_private: bool,
    pub attribution_source: Option<AttributionSource>,
    pub attribution_url: String,
    pub books: Vec<BookDescriptor>,
}

/// dry-run 時回報預計的動作
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPreview {
    pub name: String,
    pub attribution_source: Option<AttributionSource>,
    pub issues_to_add: usize,
    pub issues_not_found: Vec<BookDescriptor>,
    pub issues_skipped: Vec<(BookDescriptor, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Created(ImportResult),
    DryRun(ImportPreview),
    SkippedExisting { name: String },
}

struct PlannedItem {
    issue: Issue,
    order: i64,
}

struct ImportPlan {
    items: Vec<PlannedItem>,
    not_found: Vec<BookDescriptor>,
    skipped: Vec<(BookDescriptor, String)>,
}

impl ImportPlan {
    fn build(books: &[BookDescriptor], resolutions: Vec<Resolution>) -> Self {
        let mut plan = ImportPlan {
            items: Vec::new(),
            not_found: Vec::new(),
            skipped: Vec::new(),
        };
        let mut seen: HashSet<IssueId> = HashSet::new();

        for (book, resolution) in books.iter().zip(resolutions) {
            match resolution {
                Resolution::Resolved(issue) => {
                    if seen.insert(issue.id) {
                        plan.items.push(PlannedItem {
                            issue,
                            order: book.order,
                        });
                    } else {
                        tracing::warn!("Skipping duplicate issue {} ({})", issue, book);
                        plan.skipped
                            .push((book.clone(), DUPLICATE_ISSUE_REASON.to_string()));
                    }
                }
                Resolution::NotFound => {
                    tracing::warn!(
                        "Issue not found in database: {} ({} ID: {})",
                        book,
                        book.database_name,
                        book.database_issue_id
                    );
                    plan.not_found.push(book.clone());
                }
                Resolution::Skipped(reason) => {
                    tracing::warn!("Skipping {}: {}", book, reason);
                    plan.skipped.push((book.clone(), reason));
                }
            }
        }

        plan
    }

    fn missing_ids(&self) -> Vec<IssueId> {
        let mut ids: Vec<IssueId> = self
            .not_found
            .iter()
            .filter_map(|book| book.database_issue_id.trim().parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// 依照 `policy` 匯入一份已解析的書目清單
pub fn run_import<S>(
    store: &mut S,
    request: ImportRequest,
    policy: &ImportPolicy,
) -> Result<ImportOutcome>
where
    S: ReadingListStore + CatalogLookup,
{
    validate_attribution_url(&request.attribution_url)?;

    if store.find_list(request.owner.id, &request.name)?.is_some() {
        return match policy.existing_list {
            ExistingList::Fail => Err(ReadingListError::DuplicateListError {
                name: request.name,
            }),
            ExistingList::Skip => {
                tracing::warn!(
                    "Reading list '{}' already exists for user {} - skipping",
                    request.name,
                    request.owner.username
                );
                Ok(ImportOutcome::SkippedExisting { name: request.name })
            }
        };
    }

    let resolutions = IssueResolver::new(&*store).resolve_all(&request.books)?;
    let plan = ImportPlan::build(&request.books, resolutions);

    if !plan.not_found.is_empty() {
        match policy.missing {
            MissingIssues::Abort => {
                return Err(ReadingListError::MissingIssuesError {
                    ids: plan.missing_ids(),
                })
            }
            MissingIssues::Drop => tracing::warn!(
                "{} issue(s) not found: {:?}",
                plan.missing_ids().len(),
                plan.missing_ids()
            ),
            MissingIssues::Report => {}
        }
    }

    if policy.dry_run {
        tracing::info!(
            "Would create reading list: {} with {} issue(s)",
            request.name,
            plan.items.len()
        );
        return Ok(ImportOutcome::DryRun(ImportPreview {
            name: request.name,
            attribution_source: request.attribution_source,
            issues_to_add: plan.items.len(),
            issues_not_found: plan.not_found,
            issues_skipped: plan.skipped,
        }));
    }

    let new_list = NewReadingList {
        owner_id: request.owner.id,
        name: request.name.clone(),
        is_private: request.is_private,
        attribution_source: request.attribution_source,
        attribution_url: request.attribution_url,
    };

    let written: Result<(ReadingList, usize)> = store.atomic(|tx| {
        let reading_list = tx.create_list(new_list)?;
        let mut added = 0;
        for planned in &plan.items {
            tx.create_item(reading_list.id, planned.issue.id, planned.order)?;
            added += 1;
            tracing::debug!(
                "Added issue {} to reading list '{}' at position {}",
                planned.issue,
                reading_list.name,
                planned.order
            );
        }
        Ok((reading_list, added))
    });

    // 交易確定提交後才組出結果
    let (reading_list, issues_added) = written.map_err(|e| {
        ReadingListError::wrap_import(
            &format!("Failed to import reading list '{}'", request.name),
            e,
        )
    })?;

    tracing::info!(
        "Import completed: {} issues added, {} not found, {} skipped",
        issues_added,
        plan.not_found.len(),
        plan.skipped.len()
    );

    Ok(ImportOutcome::Created(ImportResult {
        reading_list,
        issues_added,
        issues_not_found: plan.not_found,
        issues_skipped: plan.skipped,
    }))
}

/// CBL 匯入的選項
#[derive(Debug, Clone, Default)]
pub struct CblImportOptions {
    pub is_private: bool,
    pub attribution_source: Option<AttributionSource>,
    pub attribution_url: String,
}

pub fn import_cbl_data<S>(
    store: &mut S,
    data: CblData,
    owner: &User,
    options: &CblImportOptions,
) -> Result<ImportResult>
where
    S: ReadingListStore + CatalogLookup,
{
    tracing::info!(
        "Importing CBL reading list '{}' ({} books) for {}",
        data.name,
        data.books.len(),
        owner.username
    );

    let request = ImportRequest {
        name: data.name,
        owner: owner.clone(),
        is_private: options.is_private,
        attribution_source: options.attribution_source,
        attribution_url: options.attribution_url.clone(),
        books: data.books,
    };

    match run_import(store, request, &ImportPolicy::forgiving())? {
        ImportOutcome::Created(result) => Ok(result),
        other => Err(ReadingListError::ImportError {
            message: format!("Unexpected import outcome for CBL file: {:?}", other),
            source: None,
        }),
    }
}

/// 解析並匯入 `.cbl` 檔案
pub fn import_cbl_file<S, P>(
    store: &mut S,
    path: P,
    owner: &User,
    options: &CblImportOptions,
) -> Result<ImportResult>
where
    S: ReadingListStore + CatalogLookup,
    P: AsRef<Path>,
{
    let data = parse_cbl_file(path)?;
    import_cbl_data(store, data, owner, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::model::{ItemId, ListId, ReadingListItem, UserId};
    use crate::domain::ports::ListWriter;

    fn issue(id: IssueId, cv_id: Option<i64>) -> Issue {
        Issue {
            id,
            cv_id,
            series_id: 1,
            series_name: "Crisis on Infinite Earths".to_string(),
            number: id.to_string(),
            cover_date: None,
            arc_ids: vec![],
        }
    }

    fn book(database: &str, issue_id: &str, order: i64) -> BookDescriptor {
        BookDescriptor {
            series: "Crisis on Infinite Earths".to_string(),
            number: order.to_string(),
            database_name: database.to_string(),
            database_issue_id: issue_id.to_string(),
            order,
            ..BookDescriptor::default()
        }
    }

    fn setup() -> (InMemoryStore, User) {
        let mut store = InMemoryStore::new();
        let user = store.add_user(1, "reader");
        store.add_issue(issue(1, Some(101)));
        store.add_issue(issue(2, Some(102)));
        store.add_issue(issue(3, None));
        (store, user)
    }

    fn request(owner: &User, name: &str, books: Vec<BookDescriptor>) -> ImportRequest {
        ImportRequest {
            name: name.to_string(),
            owner: owner.clone(),
            is_private: false,
            attribution_source: None,
            attribution_url: String::new(),
            books,
        }
    }

    #[test]
    fn test_forgiving_import_reports_everything() {
        let (mut store, user) = setup();
        let books = vec![
            book("cv", "101", 1),
            book("metron", "3", 2),
            book("cv", "999", 3),
            book("cv", "abc", 4),
            book("gcd", "5", 5),
            book("cv", "101", 6),
        ];

        let outcome = run_import(
            &mut store,
            request(&user, "Crisis", books),
            &ImportPolicy::forgiving(),
        )
        .unwrap();

        let result = match outcome {
            ImportOutcome::Created(result) => result,
            other => panic!("expected created, got {:?}", other),
        };
        assert_eq!(result.issues_added, 2);
        assert_eq!(result.issues_not_found.len(), 1);
        assert_eq!(result.issues_not_found[0].database_issue_id, "999");
        assert_eq!(result.issues_skipped.len(), 3);
        assert!(result.issues_skipped[0].1.contains("Invalid ComicVine ID"));
        assert!(result.issues_skipped[1].1.contains("Unsupported database"));
        assert_eq!(result.issues_skipped[2].1, DUPLICATE_ISSUE_REASON);

        let items = store.list_items(result.reading_list.id).unwrap();
        let orders: Vec<(IssueId, i64)> = items.iter().map(|i| (i.issue_id, i.order)).collect();
        assert_eq!(orders, vec![(1, 1), (3, 2)]);
    }

    #[test]
    fn test_zero_resolved_still_creates_list() {
        let (mut store, user) = setup();
        let outcome = run_import(
            &mut store,
            request(&user, "Nothing", vec![book("cv", "404", 1)]),
            &ImportPolicy::forgiving(),
        )
        .unwrap();

        assert!(matches!(outcome, ImportOutcome::Created(ref r) if r.issues_added == 0));
        assert_eq!(store.reading_lists().len(), 1);
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_duplicate_name_fails_without_writes() {
        let (mut store, user) = setup();
        run_import(
            &mut store,
            request(&user, "Crisis", vec![book("cv", "101", 1)]),
            &ImportPolicy::forgiving(),
        )
        .unwrap();
        let before = store.snapshot().clone();

        let err = run_import(
            &mut store,
            request(&user, "Crisis", vec![book("cv", "102", 1)]),
            &ImportPolicy::forgiving(),
        )
        .unwrap_err();

        assert!(err.is_import_error());
        assert!(err.to_string().contains("'Crisis' already exists"));
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn test_strict_policy_aborts_on_missing() {
        let (mut store, user) = setup();
        let err = run_import(
            &mut store,
            request(
                &user,
                "Strict",
                vec![book("metron", "1", 0), book("metron", "77", 1)],
            ),
            &ImportPolicy::strict(false, false),
        )
        .unwrap_err();

        match err {
            ReadingListError::MissingIssuesError { ids } => assert_eq!(ids, vec![77]),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(store.reading_lists().is_empty());
    }

    #[test]
    fn test_strict_policy_drops_missing_when_lenient() {
        let (mut store, user) = setup();
        let outcome = run_import(
            &mut store,
            request(
                &user,
                "Lenient",
                vec![book("metron", "1", 0), book("metron", "77", 1)],
            ),
            &ImportPolicy::strict(true, false),
        )
        .unwrap();

        match outcome {
            ImportOutcome::Created(result) => {
                assert_eq!(result.issues_added, 1);
                assert_eq!(result.issues_not_found.len(), 1);
            }
            other => panic!("expected created, got {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (mut store, user) = setup();
        let outcome = run_import(
            &mut store,
            request(&user, "Preview", vec![book("metron", "1", 0)]),
            &ImportPolicy::strict(false, true),
        )
        .unwrap();

        assert!(matches!(outcome, ImportOutcome::DryRun(ref p) if p.issues_to_add == 1));
        assert!(store.reading_lists().is_empty());
    }

    #[test]
    fn test_invalid_attribution_url_rejected() {
        let (mut store, user) = setup();
        let mut req = request(&user, "Bad URL", vec![]);
        req.attribution_url = "javascript:alert(1)".to_string();

        let err = run_import(&mut store, req, &ImportPolicy::forgiving()).unwrap_err();
        assert!(matches!(err, ReadingListError::ValidationError { .. }));
        assert!(store.reading_lists().is_empty());
    }

    /// 在第 N 次寫入項目時失敗的儲存層
    struct FailingStore {
        inner: InMemoryStore,
        fail_on_item: usize,
    }

    struct FailingWriter<'w> {
        inner: &'w mut dyn ListWriter,
        remaining: usize,
    }

    impl ListWriter for FailingWriter<'_> {
        fn create_list(&mut self, new_list: NewReadingList) -> Result<ReadingList> {
            self.inner.create_list(new_list)
        }

        fn create_item(
            &mut self,
            list_id: ListId,
            issue_id: IssueId,
            order: i64,
        ) -> Result<ReadingListItem> {
            if self.remaining == 0 {
                return Err(ReadingListError::storage("connection reset"));
            }
            self.remaining -= 1;
            self.inner.create_item(list_id, issue_id, order)
        }

        fn update_item_order(&mut self, item_id: ItemId, order: i64) -> Result<()> {
            self.inner.update_item_order(item_id, order)
        }
    }

    impl CatalogLookup for FailingStore {
        fn find_issue_by_cv_id(&self, cv_id: i64) -> Result<Option<Issue>> {
            self.inner.find_issue_by_cv_id(cv_id)
        }

        fn find_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>> {
            self.inner.find_issue_by_id(id)
        }

        fn issues_in_series(&self, series_id: i64) -> Result<Vec<Issue>> {
            self.inner.issues_in_series(series_id)
        }

        fn issues_in_arc(&self, arc_id: i64) -> Result<Vec<Issue>> {
            self.inner.issues_in_arc(arc_id)
        }
    }

    impl ReadingListStore for FailingStore {
        fn find_list(&self, owner_id: UserId, name: &str) -> Result<Option<ReadingList>> {
            self.inner.find_list(owner_id, name)
        }

        fn find_list_by_slug(&self, slug: &str) -> Result<Option<ReadingList>> {
            self.inner.find_list_by_slug(slug)
        }

        fn list_items(&self, list_id: ListId) -> Result<Vec<ReadingListItem>> {
            self.inner.list_items(list_id)
        }

        fn atomic<T, F>(&mut self, work: F) -> Result<T>
        where
            F: FnOnce(&mut dyn ListWriter) -> Result<T>,
        {
            let remaining = self.fail_on_item;
            self.inner.atomic(|tx| {
                let mut failing = FailingWriter {
                    inner: tx,
                    remaining,
                };
                work(&mut failing)
            })
        }
    }

    #[test]
    fn test_unexpected_failure_rolls_back_and_wraps() {
        let (inner, user) = setup();
        let mut store = FailingStore {
            inner,
            fail_on_item: 1,
        };

        let err = run_import(
            &mut store,
            request(
                &user,
                "Interrupted",
                vec![book("cv", "101", 1), book("cv", "102", 2)],
            ),
            &ImportPolicy::forgiving(),
        )
        .unwrap_err();

        assert!(matches!(err, ReadingListError::ImportError { .. }));
        assert!(err.to_string().contains("connection reset"));
        assert!(store.inner.reading_lists().is_empty());
        assert_eq!(store.inner.item_count(), 0);
    }
}
