use crate::domain::model::{BookDescriptor, Issue, IssueId, Resolution};
use crate::domain::ports::CatalogLookup;
use crate::utils::error::Result;
use std::collections::HashMap;

const COMICVINE: &str = "cv";
const METRON: &str = "metron";

/// 外部 id 所屬的命名空間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    ComicVine,
    Internal,
}

/// 分類結果：可查詢的 id，或直接略過的原因
#[derive(Debug, PartialEq, Eq)]
enum Classified {
    Lookup(Namespace, i64),
    Skip(String),
}

fn classify(book: &BookDescriptor) -> Classified {
    let raw = book.database_issue_id.trim();
    let namespace = match book.database_name.as_str() {
        COMICVINE if !raw.is_empty() => Namespace::ComicVine,
        METRON if !raw.is_empty() => Namespace::Internal,
        _ => {
            return Classified::Skip(format!(
                "Unsupported database '{}' or missing issue ID",
                book.database_name
            ))
        }
    };

    match raw.parse::<i64>() {
        Ok(id) => Classified::Lookup(namespace, id),
        Err(_) => {
            let label = match namespace {
                Namespace::ComicVine => "ComicVine",
                Namespace::Internal => "Metron",
            };
            Classified::Skip(format!(
                "Invalid {} ID: '{}'",
                label, book.database_issue_id
            ))
        }
    }
}

pub struct IssueResolver<'a, C: CatalogLookup> {
    catalog: &'a C,
}

impl<'a, C: CatalogLookup> IssueResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// 將一筆描述對應到目錄中的期刊
    pub fn resolve(&self, book: &BookDescriptor) -> Result<Resolution> {
        let resolution = match classify(book) {
            Classified::Skip(reason) => Resolution::Skipped(reason),
            Classified::Lookup(Namespace::ComicVine, id) => {
                match self.catalog.find_issue_by_cv_id(id)? {
                    Some(issue) => Resolution::Resolved(issue),
                    None => Resolution::NotFound,
                }
            }
            Classified::Lookup(Namespace::Internal, id) => {
                match self.catalog.find_issue_by_id(id)? {
                    Some(issue) => Resolution::Resolved(issue),
                    None => Resolution::NotFound,
                }
            }
        };
        Ok(resolution)
    }

    /// 批次解析：每個命名空間只做一次批量查詢，結果與逐筆 `resolve` 相同
    pub fn resolve_all(&self, books: &[BookDescriptor]) -> Result<Vec<Resolution>> {
        let classified: Vec<Classified> = books.iter().map(classify).collect();

        let mut cv_ids = Vec::new();
        let mut internal_ids = Vec::new();
        for entry in &classified {
            match entry {
                Classified::Lookup(Namespace::ComicVine, id) => cv_ids.push(*id),
                Classified::Lookup(Namespace::Internal, id) => internal_ids.push(*id),
                Classified::Skip(_) => {}
            }
        }
        cv_ids.sort_unstable();
        cv_ids.dedup();
        internal_ids.sort_unstable();
        internal_ids.dedup();

        let by_cv: HashMap<i64, Issue> = if cv_ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog
                .find_issues_by_cv_ids(&cv_ids)?
                .into_iter()
                .filter_map(|issue| issue.cv_id.map(|cv| (cv, issue)))
                .collect()
        };
        let by_id: HashMap<IssueId, Issue> = if internal_ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog
                .find_issues_by_ids(&internal_ids)?
                .into_iter()
                .map(|issue| (issue.id, issue))
                .collect()
        };

        let resolutions = classified
            .into_iter()
            .map(|entry| match entry {
                Classified::Skip(reason) => Resolution::Skipped(reason),
                Classified::Lookup(Namespace::ComicVine, id) => by_cv
                    .get(&id)
                    .cloned()
                    .map_or(Resolution::NotFound, Resolution::Resolved),
                Classified::Lookup(Namespace::Internal, id) => by_id
                    .get(&id)
                    .cloned()
                    .map_or(Resolution::NotFound, Resolution::Resolved),
            })
            .collect();

        Ok(resolutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn catalog() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.add_issue(Issue {
            id: 10,
            cv_id: Some(25335),
            series_id: 1,
            series_name: "Watchmen".to_string(),
            number: "1".to_string(),
            cover_date: None,
            arc_ids: vec![],
        });
        store.add_issue(Issue {
            id: 11,
            cv_id: None,
            series_id: 1,
            series_name: "Watchmen".to_string(),
            number: "2".to_string(),
            cover_date: None,
            arc_ids: vec![],
        });
        store
    }

    fn book(database: &str, issue: &str) -> BookDescriptor {
        BookDescriptor {
            series: "Watchmen".to_string(),
            number: "1".to_string(),
            database_name: database.to_string(),
            database_issue_id: issue.to_string(),
            order: 1,
            ..BookDescriptor::default()
        }
    }

    #[test]
    fn test_resolve_comicvine() {
        let store = catalog();
        let resolver = IssueResolver::new(&store);

        match resolver.resolve(&book("cv", "25335")).unwrap() {
            Resolution::Resolved(issue) => assert_eq!(issue.id, 10),
            other => panic!("expected resolved, got {:?}", other),
        }
        assert_eq!(resolver.resolve(&book("cv", "999")).unwrap(), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_metron_by_primary_key() {
        let store = catalog();
        let resolver = IssueResolver::new(&store);

        match resolver.resolve(&book("metron", "11")).unwrap() {
            Resolution::Resolved(issue) => assert_eq!(issue.number, "2"),
            other => panic!("expected resolved, got {:?}", other),
        }
        // cv id 25335 is not a primary key
        assert_eq!(
            resolver.resolve(&book("metron", "25335")).unwrap(),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_invalid_ids_are_skipped_not_missing() {
        let store = catalog();
        let resolver = IssueResolver::new(&store);

        match resolver.resolve(&book("cv", "abc")).unwrap() {
            Resolution::Skipped(reason) => assert_eq!(reason, "Invalid ComicVine ID: 'abc'"),
            other => panic!("expected skipped, got {:?}", other),
        }
        match resolver.resolve(&book("metron", "12x")).unwrap() {
            Resolution::Skipped(reason) => assert!(reason.contains("Invalid Metron ID")),
            other => panic!("expected skipped, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_database() {
        let store = catalog();
        let resolver = IssueResolver::new(&store);

        match resolver.resolve(&book("gcd", "1")).unwrap() {
            Resolution::Skipped(reason) => {
                assert_eq!(reason, "Unsupported database 'gcd' or missing issue ID")
            }
            other => panic!("expected skipped, got {:?}", other),
        }
        match resolver.resolve(&book("cv", "")).unwrap() {
            Resolution::Skipped(reason) => assert!(reason.contains("Unsupported database 'cv'")),
            other => panic!("expected skipped, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_all_matches_single_resolution() {
        let store = catalog();
        let resolver = IssueResolver::new(&store);
        let books = vec![
            book("cv", "25335"),
            book("metron", "11"),
            book("cv", "404"),
            book("gcd", "1"),
            book("metron", " 10 "),
        ];

        let bulk = resolver.resolve_all(&books).unwrap();
        let single: Vec<Resolution> = books.iter().map(|b| resolver.resolve(b).unwrap()).collect();
        assert_eq!(bulk, single);
        assert!(matches!(bulk[4], Resolution::Resolved(ref issue) if issue.id == 10));
    }
}
