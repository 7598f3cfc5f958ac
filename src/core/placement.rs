use crate::core::reorder::ReorderPlan;
use crate::domain::model::{Issue, IssueId, ReadingListItem};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Beginning,
    End,
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginning" | "start" => Ok(Self::Beginning),
            "end" => Ok(Self::End),
            other => Err(format!("Unknown position '{}', expected 'beginning' or 'end'", other)),
        }
    }
}

/// 依期號篩選系列中的範圍（含頭尾）；issues 需已依封面日期排序
pub fn select_range(issues: Vec<Issue>, start: Option<&str>, end: Option<&str>) -> Vec<Issue> {
    let mut in_range = start.is_none();
    let mut selected = Vec::new();

    for issue in issues {
        if !in_range && Some(issue.number.as_str()) == start {
            in_range = true;
        }
        if in_range {
            let is_end = Some(issue.number.as_str()) == end;
            selected.push(issue);
            if is_end {
                break;
            }
        }
    }

    selected
}

/// 過濾掉清單中已有的期刊
pub fn new_candidates(existing: &[ReadingListItem], candidates: Vec<Issue>) -> Vec<Issue> {
    let mut present: HashSet<IssueId> = existing.iter().map(|item| item.issue_id).collect();
    candidates
        .into_iter()
        .filter(|issue| present.insert(issue.id))
        .collect()
}

/// 將新期刊放在清單開頭或結尾
pub fn plan_placement(
    existing: &[ReadingListItem],
    new_issues: &[Issue],
    position: Position,
) -> ReorderPlan {
    let mut plan = ReorderPlan::default();

    match position {
        Position::Beginning => {
            let count = new_issues.len() as i64;
            for (idx, issue) in new_issues.iter().enumerate() {
                plan.to_create.push((issue.id, idx as i64 + 1));
            }
            for (idx, item) in existing.iter().enumerate() {
                let order = count + idx as i64 + 1;
                if item.order != order {
                    plan.to_update.push((item.id, order));
                }
            }
        }
        Position::End => {
            let max_order = existing.iter().map(|item| item.order).max().unwrap_or(0);
            for (idx, issue) in new_issues.iter().enumerate() {
                plan.to_create.push((issue.id, max_order + idx as i64 + 1));
            }
        }
    }

    plan
}
