use crate::domain::model::{AttributionSource, BookDescriptor, IssueId};
use crate::utils::error::{ReadingListError, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

/// 批次檔中的 id 一律是內部主鍵
pub const INTERNAL_DATABASE: &str = "metron";

#[derive(Debug, Deserialize)]
struct RawBatchFile {
    name: Option<String>,
    #[serde(default)]
    source: Option<String>,
    books: Option<Vec<RawBatchBook>>,
}

#[derive(Debug, Deserialize)]
struct RawBatchBook {
    index: i64,
    database: RawDatabase,
}

#[derive(Debug, Deserialize)]
struct RawDatabase {
    id: IssueId,
}

/// 一個 JSON 批次檔的內容
#[derive(Debug, Clone, PartialEq)]
pub struct BatchList {
    pub name: String,
    pub source_code: String,
    pub attribution_source: Option<AttributionSource>,
    pub books: Vec<BookDescriptor>,
}

fn year_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\[\(]\d{4}(?:-\d{4})?[\]\)]\s*").expect("year prefix pattern is valid")
    })
}

/// 移除名稱開頭的年份前綴，例如 `[2015-2016]`、`(2015)`
pub fn sanitize_name(name: &str) -> String {
    year_prefix().replace(name, "").trim().to_string()
}

pub fn load_batch_file<P: AsRef<Path>>(path: P) -> Result<BatchList> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        return Err(ReadingListError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    parse_batch_str(&file_name, &content)
}

pub fn parse_batch_str(file_name: &str, content: &str) -> Result<BatchList> {
    let batch_error = |message: String| ReadingListError::BatchFileError {
        file: file_name.to_string(),
        message,
    };

    let raw: RawBatchFile = serde_json::from_str(content)
        .map_err(|e| batch_error(format!("Invalid JSON in {}: {}", file_name, e)))?;

    let name = raw
        .name
        .ok_or_else(|| batch_error(format!("Missing 'name' field in {}", file_name)))?;
    let books = raw
        .books
        .ok_or_else(|| batch_error(format!("Missing 'books' field in {}", file_name)))?;

    let source_code = raw.source.unwrap_or_default();
    let attribution_source = AttributionSource::from_code(&source_code);
    if attribution_source.is_none() && !source_code.is_empty() {
        tracing::debug!("Unknown attribution source '{}' in {}", source_code, file_name);
    }

    let books = books
        .into_iter()
        .map(|book| {
            if book.index < 0 {
                return Err(batch_error(format!(
                    "Negative index {} for issue {} in {}",
                    book.index, book.database.id, file_name
                )));
            }
            Ok(BookDescriptor {
                database_name: INTERNAL_DATABASE.to_string(),
                database_issue_id: book.database.id.to_string(),
                order: book.index,
                ..BookDescriptor::default()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BatchList {
        name: sanitize_name(&name),
        source_code,
        attribution_source,
        books,
    })
}
