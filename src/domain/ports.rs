use crate::domain::model::{
    Issue, IssueId, ItemId, ListId, NewReadingList, ReadingList, ReadingListItem, User, UserId,
};
use crate::utils::error::Result;

/// 期刊目錄查詢介面
pub trait CatalogLookup {
    fn find_issue_by_cv_id(&self, cv_id: i64) -> Result<Option<Issue>>;

    fn find_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>>;

    /// 批次查詢主鍵；不存在的 id 直接略過
    fn find_issues_by_ids(&self, ids: &[IssueId]) -> Result<Vec<Issue>> {
        let mut issues = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(issue) = self.find_issue_by_id(*id)? {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    fn find_issues_by_cv_ids(&self, cv_ids: &[i64]) -> Result<Vec<Issue>> {
        let mut issues = Vec::with_capacity(cv_ids.len());
        for cv_id in cv_ids {
            if let Some(issue) = self.find_issue_by_cv_id(*cv_id)? {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    /// 依封面日期、期號排序
    fn issues_in_series(&self, series_id: i64) -> Result<Vec<Issue>>;

    /// 依封面日期、期號排序
    fn issues_in_arc(&self, arc_id: i64) -> Result<Vec<Issue>>;
}

pub trait UserDirectory {
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// 交易內可用的寫入操作；違反唯一性約束時回傳 ConflictError
pub trait ListWriter {
    fn create_list(&mut self, new_list: NewReadingList) -> Result<ReadingList>;

    fn create_item(&mut self, list_id: ListId, issue_id: IssueId, order: i64)
        -> Result<ReadingListItem>;

    fn update_item_order(&mut self, item_id: ItemId, order: i64) -> Result<()>;
}

pub trait ReadingListStore {
    fn find_list(&self, owner_id: UserId, name: &str) -> Result<Option<ReadingList>>;

    fn find_list_by_slug(&self, slug: &str) -> Result<Option<ReadingList>>;

    /// 依 order 遞增回傳
    fn list_items(&self, list_id: ListId) -> Result<Vec<ReadingListItem>>;

    /// 在單一交易中執行 `work`：成功才提交，失敗則全部回滾
    fn atomic<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ListWriter) -> Result<T>;
}
