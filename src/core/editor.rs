use crate::core::placement::{new_candidates, plan_placement, select_range, Position};
use crate::core::reorder::{parse_issue_order, reconcile, ReorderPlan};
use crate::domain::model::{Issue, IssueId, ReadingList, User};
use crate::domain::ports::{CatalogLookup, ReadingListStore};
use crate::utils::error::{ReadingListError, Result};
use std::collections::HashMap;

/// 一次編輯的結果統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub list_name: String,
    pub added: usize,
    pub reordered: usize,
    pub skipped: usize,
    pub added_labels: Vec<String>,
}

impl EditSummary {
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.reordered > 0
    }

    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        match self.added {
            0 => {}
            1 => parts.push(format!(
                "Added {}",
                self.added_labels.first().map(String::as_str).unwrap_or("1 issue")
            )),
            n => parts.push(format!("Added {} issue(s)", n)),
        }
        if self.reordered > 0 {
            parts.push(format!("reordered {} existing issue(s)", self.reordered));
        }

        let mut message = if parts.is_empty() {
            String::new()
        } else {
            format!("{} in '{}'!", parts.join(", "), self.list_name)
        };
        if self.skipped > 0 {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&format!("Skipped {} duplicate issue(s).", self.skipped));
        }
        if message.is_empty() {
            message.push_str("No changes were made.");
        }
        message
    }
}

/// 單一清單範圍內的編輯操作：必須是清單擁有者
pub struct ReadingListEditor<'s, S> {
    store: &'s mut S,
    list: ReadingList,
}

impl<'s, S> ReadingListEditor<'s, S>
where
    S: ReadingListStore + CatalogLookup,
{
    pub fn open(store: &'s mut S, slug: &str, owner: &User) -> Result<Self> {
        let list = store
            .find_list_by_slug(slug)?
            .ok_or_else(|| ReadingListError::not_found("Reading list", slug))?;

        if list.owner_id != owner.id {
            return Err(ReadingListError::PermissionError {
                user: owner.username.clone(),
                list: list.name.clone(),
            });
        }

        Ok(Self { store, list })
    }

    pub fn reading_list(&self) -> &ReadingList {
        &self.list
    }

    /// 加入選取的期刊，並依 `issue_order`（逗號分隔、含既有與新 id）重新排序
    pub fn add_issues(&mut self, selected: &[IssueId], issue_order: &str) -> Result<EditSummary> {
        let explicit = parse_issue_order(issue_order)?;

        let known: HashMap<IssueId, Issue> = self
            .store
            .find_issues_by_ids(selected)?
            .into_iter()
            .map(|issue| (issue.id, issue))
            .collect();
        let selected: Vec<IssueId> = selected
            .iter()
            .copied()
            .filter(|id| {
                let exists = known.contains_key(id);
                if !exists {
                    tracing::warn!("Selected issue {} does not exist; ignoring", id);
                }
                exists
            })
            .collect();

        let existing = self.store.list_items(self.list.id)?;
        let explicit = if explicit.is_empty() {
            None
        } else {
            Some(explicit.as_slice())
        };
        let plan = reconcile(&existing, &selected, explicit);
        if plan.ignored > 0 {
            tracing::debug!("{} id(s) in the requested order were not recognised", plan.ignored);
        }

        self.apply(plan, &known)
    }

    /// 加入系列中的期刊（可限定期號範圍）
    pub fn add_from_series(
        &mut self,
        series_id: i64,
        start: Option<&str>,
        end: Option<&str>,
        position: Position,
    ) -> Result<EditSummary> {
        let issues = self.store.issues_in_series(series_id)?;
        let issues = select_range(issues, start, end);
        self.place(issues, position)
    }

    /// 加入故事線中的所有期刊
    pub fn add_from_arc(&mut self, arc_id: i64, position: Position) -> Result<EditSummary> {
        let issues = self.store.issues_in_arc(arc_id)?;
        self.place(issues, position)
    }

    fn place(&mut self, candidates: Vec<Issue>, position: Position) -> Result<EditSummary> {
        let existing = self.store.list_items(self.list.id)?;
        let fresh = new_candidates(&existing, candidates);

        if fresh.is_empty() {
            tracing::info!("No new issues to add to '{}'", self.list.name);
            return Ok(EditSummary {
                list_name: self.list.name.clone(),
                ..EditSummary::default()
            });
        }

        let plan = plan_placement(&existing, &fresh, position);
        let known: HashMap<IssueId, Issue> =
            fresh.into_iter().map(|issue| (issue.id, issue)).collect();
        self.apply(plan, &known)
    }

    fn apply(&mut self, plan: ReorderPlan, known: &HashMap<IssueId, Issue>) -> Result<EditSummary> {
        let list_id = self.list.id;
        let mut summary = EditSummary {
            list_name: self.list.name.clone(),
            skipped: plan.skipped,
            ..EditSummary::default()
        };

        if plan.is_empty() {
            return Ok(summary);
        }

        self.store.atomic(|tx| {
            for (item_id, order) in &plan.to_update {
                tx.update_item_order(*item_id, *order)?;
            }
            for (issue_id, order) in &plan.to_create {
                tx.create_item(list_id, *issue_id, *order)?;
            }
            Ok(())
        })?;

        summary.reordered = plan.to_update.len();
        summary.added = plan.to_create.len();
        summary.added_labels = plan
            .to_create
            .iter()
            .map(|(issue_id, _)| {
                known
                    .get(issue_id)
                    .map(|issue| issue.to_string())
                    .unwrap_or_else(|| format!("issue {}", issue_id))
            })
            .collect();

        tracing::info!(
            "Updated reading list '{}': {} added, {} reordered, {} skipped",
            summary.list_name,
            summary.added,
            summary.reordered,
            summary.skipped
        );
        Ok(summary)
    }
}
