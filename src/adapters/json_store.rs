use crate::adapters::memory::{InMemoryStore, StoreSnapshot};
use crate::domain::model::{
    Issue, IssueId, ListId, ReadingList, ReadingListItem, User, UserId,
};
use crate::domain::ports::{CatalogLookup, ListWriter, ReadingListStore, UserDirectory};
use crate::utils::error::{ReadingListError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 以 JSON 檔保存的儲存層；交易提交後才寫回檔案
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ReadingListError::FileNotFound { path });
        }

        let content = fs::read_to_string(&path)?;
        let invalid = |reason: String| {
            ReadingListError::storage(format!("Invalid store file {}: {}", path.display(), reason))
        };
        // 所有欄位都有預設值，頂層必須先確認是物件
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        if !value.is_object() {
            return Err(invalid("expected a JSON object at the top level".to_string()));
        }
        let snapshot: StoreSnapshot =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

        tracing::debug!(
            "Loaded store {} ({} issues, {} reading lists)",
            path.display(),
            snapshot.issues.len(),
            snapshot.reading_lists.len()
        );

        Ok(Self {
            path,
            inner: InMemoryStore::from_snapshot(snapshot),
        })
    }

    /// 建立新的儲存檔
    pub fn create<P: AsRef<Path>>(path: P, snapshot: StoreSnapshot) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            inner: InMemoryStore::from_snapshot(snapshot),
        };
        store.persist()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        self.inner.snapshot()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // 先寫暫存檔再改名，避免寫到一半留下損毀的檔案
        let tmp_path = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(self.inner.snapshot())?;
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl CatalogLookup for JsonFileStore {
    fn find_issue_by_cv_id(&self, cv_id: i64) -> Result<Option<Issue>> {
        self.inner.find_issue_by_cv_id(cv_id)
    }

    fn find_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>> {
        self.inner.find_issue_by_id(id)
    }

    fn find_issues_by_ids(&self, ids: &[IssueId]) -> Result<Vec<Issue>> {
        self.inner.find_issues_by_ids(ids)
    }

    fn issues_in_series(&self, series_id: i64) -> Result<Vec<Issue>> {
        self.inner.issues_in_series(series_id)
    }

    fn issues_in_arc(&self, arc_id: i64) -> Result<Vec<Issue>> {
        self.inner.issues_in_arc(arc_id)
    }
}

impl UserDirectory for JsonFileStore {
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username)
    }
}

impl ReadingListStore for JsonFileStore {
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
        let previous = self.inner.clone();
        let output = self.inner.atomic(work)?;

        if let Err(e) = self.persist() {
            // 檔案寫入失敗時記憶體狀態也一併回滾
            self.inner = previous;
            return Err(e);
        }
        Ok(output)
    }
}
