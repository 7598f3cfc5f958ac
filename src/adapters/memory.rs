use crate::domain::model::{
    Issue, IssueId, ItemId, ListId, NewReadingList, ReadingList, ReadingListItem, User, UserId,
};
use crate::domain::ports::{CatalogLookup, ListWriter, ReadingListStore, UserDirectory};
use crate::utils::error::{ReadingListError, Result};
use crate::utils::slug::unique_slug;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 儲存層的完整狀態，也是 JSON 檔案的格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub reading_lists: Vec<ReadingList>,
    #[serde(default)]
    pub items: Vec<ReadingListItem>,
    #[serde(default)]
    pub next_list_id: ListId,
    #[serde(default)]
    pub next_item_id: ItemId,
}

impl StoreSnapshot {
    fn allocate_list_id(&mut self) -> ListId {
        let max_existing = self.reading_lists.iter().map(|l| l.id).max().unwrap_or(0);
        self.next_list_id = self.next_list_id.max(max_existing) + 1;
        self.next_list_id
    }

    fn allocate_item_id(&mut self) -> ItemId {
        let max_existing = self.items.iter().map(|i| i.id).max().unwrap_or(0);
        self.next_item_id = self.next_item_id.max(max_existing) + 1;
        self.next_item_id
    }

    fn touch_list(&mut self, list_id: ListId) {
        if let Some(list) = self.reading_lists.iter_mut().find(|l| l.id == list_id) {
            list.modified = Utc::now();
        }
    }
}

impl ListWriter for StoreSnapshot {
    fn create_list(&mut self, new_list: NewReadingList) -> Result<ReadingList> {
        if self
            .reading_lists
            .iter()
            .any(|l| l.owner_id == new_list.owner_id && l.name == new_list.name)
        {
            return Err(ReadingListError::ConflictError {
                message: format!(
                    "reading list '{}' already exists for user {}",
                    new_list.name, new_list.owner_id
                ),
            });
        }

        let existing_slugs: HashSet<String> =
            self.reading_lists.iter().map(|l| l.slug.clone()).collect();
        let now = Utc::now();
        let list = ReadingList {
            id: self.allocate_list_id(),
            owner_id: new_list.owner_id,
            slug: unique_slug(&new_list.name, &existing_slugs),
            name: new_list.name,
            is_private: new_list.is_private,
            attribution_source: new_list.attribution_source,
            attribution_url: new_list.attribution_url,
            created_on: now,
            modified: now,
        };
        self.reading_lists.push(list.clone());
        Ok(list)
    }

    fn create_item(
        &mut self,
        list_id: ListId,
        issue_id: IssueId,
        order: i64,
    ) -> Result<ReadingListItem> {
        if !self.reading_lists.iter().any(|l| l.id == list_id) {
            return Err(ReadingListError::not_found("Reading list", list_id));
        }
        if self
            .items
            .iter()
            .any(|i| i.list_id == list_id && i.issue_id == issue_id)
        {
            return Err(ReadingListError::ConflictError {
                message: format!("issue {} is already in reading list {}", issue_id, list_id),
            });
        }

        let item = ReadingListItem {
            id: self.allocate_item_id(),
            list_id,
            issue_id,
            order,
            issue_type: None,
        };
        self.items.push(item.clone());
        self.touch_list(list_id);
        Ok(item)
    }

    fn update_item_order(&mut self, item_id: ItemId, order: i64) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ReadingListError::not_found("Reading list item", item_id))?;
        item.order = order;
        let list_id = item.list_id;
        self.touch_list(list_id);
        Ok(())
    }
}

/// 記憶體內的目錄與閱讀清單儲存；交易在副本上執行，成功才替換
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: StoreSnapshot,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(data: StoreSnapshot) -> Self {
        Self { data }
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.data
    }

    pub fn add_user(&mut self, id: UserId, username: &str) -> User {
        let user = User {
            id,
            username: username.to_string(),
        };
        self.data.users.push(user.clone());
        user
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.data.issues.push(issue);
    }

    pub fn reading_lists(&self) -> &[ReadingList] {
        &self.data.reading_lists
    }

    pub fn item_count(&self) -> usize {
        self.data.items.len()
    }
}

fn catalog_order(issues: &mut [Issue]) {
    // 與資料庫一致：沒有封面日期的排在最後
    issues.sort_by(|a, b| {
        (a.cover_date.is_none(), a.cover_date, &a.number).cmp(&(
            b.cover_date.is_none(),
            b.cover_date,
            &b.number,
        ))
    });
}

impl CatalogLookup for InMemoryStore {
    fn find_issue_by_cv_id(&self, cv_id: i64) -> Result<Option<Issue>> {
        Ok(self
            .data
            .issues
            .iter()
            .find(|i| i.cv_id == Some(cv_id))
            .cloned())
    }

    fn find_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>> {
        Ok(self.data.issues.iter().find(|i| i.id == id).cloned())
    }

    fn find_issues_by_ids(&self, ids: &[IssueId]) -> Result<Vec<Issue>> {
        let wanted: HashSet<IssueId> = ids.iter().copied().collect();
        Ok(self
            .data
            .issues
            .iter()
            .filter(|i| wanted.contains(&i.id))
            .cloned()
            .collect())
    }

    fn issues_in_series(&self, series_id: i64) -> Result<Vec<Issue>> {
        let mut issues: Vec<Issue> = self
            .data
            .issues
            .iter()
            .filter(|i| i.series_id == series_id)
            .cloned()
            .collect();
        catalog_order(&mut issues);
        Ok(issues)
    }

    fn issues_in_arc(&self, arc_id: i64) -> Result<Vec<Issue>> {
        let mut issues: Vec<Issue> = self
            .data
            .issues
            .iter()
            .filter(|i| i.arc_ids.contains(&arc_id))
            .cloned()
            .collect();
        catalog_order(&mut issues);
        Ok(issues)
    }
}

impl UserDirectory for InMemoryStore {
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .data
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

impl ReadingListStore for InMemoryStore {
    fn find_list(&self, owner_id: UserId, name: &str) -> Result<Option<ReadingList>> {
        Ok(self
            .data
            .reading_lists
            .iter()
            .find(|l| l.owner_id == owner_id && l.name == name)
            .cloned())
    }

    fn find_list_by_slug(&self, slug: &str) -> Result<Option<ReadingList>> {
        Ok(self
            .data
            .reading_lists
            .iter()
            .find(|l| l.slug == slug)
            .cloned())
    }

    fn list_items(&self, list_id: ListId) -> Result<Vec<ReadingListItem>> {
        let mut items: Vec<ReadingListItem> = self
            .data
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.order, i.id));
        Ok(items)
    }

    fn atomic<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ListWriter) -> Result<T>,
    {
        let mut staged = self.data.clone();
        let output = work(&mut staged)?;
        self.data = staged;
        Ok(output)
    }
}
