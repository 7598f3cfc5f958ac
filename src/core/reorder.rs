use crate::domain::model::{IssueId, ItemId, ReadingListItem};
use crate::utils::error::{ReadingListError, Result};
use std::collections::{HashMap, HashSet};

/// 重新排序所需的寫入：只更新 order 或新增項目，從不刪除
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderPlan {
    pub to_update: Vec<(ItemId, i64)>,
    pub to_create: Vec<(IssueId, i64)>,
    /// 同一次呼叫中重複出現的 id
    pub skipped: usize,
    /// 既不在清單中也未被選取的 id
    pub ignored: usize,
}

impl ReorderPlan {
    pub fn is_empty(&self) -> bool {
        self.to_update.is_empty() && self.to_create.is_empty()
    }
}

/// Compute the writes that bring a list to the requested order.
///
/// `existing` must be in ascending `order`. Without `explicit_order` the
/// target is the current items followed by `selected`. With it, the walk
/// follows `explicit_order`; existing items it leaves out keep their relative
/// order after it, and selected issues it leaves out are appended last.
pub fn reconcile(
    existing: &[ReadingListItem],
    selected: &[IssueId],
    explicit_order: Option<&[IssueId]>,
) -> ReorderPlan {
    let by_issue: HashMap<IssueId, &ReadingListItem> =
        existing.iter().map(|item| (item.issue_id, item)).collect();
    let selected_set: HashSet<IssueId> = selected.iter().copied().collect();

    let target: Vec<IssueId> = match explicit_order {
        Some(order) => order.to_vec(),
        None => existing
            .iter()
            .map(|item| item.issue_id)
            .chain(selected.iter().copied())
            .collect(),
    };

    let mut plan = ReorderPlan::default();
    let mut placed: HashSet<IssueId> = HashSet::new();
    let mut position: i64 = 0;

    let place = |issue_id: IssueId, plan: &mut ReorderPlan, position: &mut i64| {
        if let Some(item) = by_issue.get(&issue_id) {
            *position += 1;
            if item.order != *position {
                plan.to_update.push((item.id, *position));
            }
        } else {
            *position += 1;
            plan.to_create.push((issue_id, *position));
        }
    };

    for issue_id in target {
        if !by_issue.contains_key(&issue_id) && !selected_set.contains(&issue_id) {
            plan.ignored += 1;
            continue;
        }
        if !placed.insert(issue_id) {
            plan.skipped += 1;
            continue;
        }
        place(issue_id, &mut plan, &mut position);
    }

    if explicit_order.is_some() {
        let leftovers: Vec<IssueId> = existing
            .iter()
            .map(|item| item.issue_id)
            .chain(selected.iter().copied())
            .filter(|issue_id| !placed.contains(issue_id))
            .collect();
        for issue_id in leftovers {
            if placed.insert(issue_id) {
                place(issue_id, &mut plan, &mut position);
            }
        }
    }

    plan
}

/// 解析以逗號分隔的 id 清單；空白段落忽略
pub fn parse_issue_order(raw: &str) -> Result<Vec<IssueId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.parse::<IssueId>().map_err(|_| {
                ReadingListError::validation(format!("Invalid issue id in order: '{}'", segment))
            })
        })
        .collect()
}
