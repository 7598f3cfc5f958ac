//! Comic Book List (`.cbl`) reader.
//!
//! A CBL document is an XML export of an ordered reading list:
//!
//! ```xml
//! <ReadingList>
//!   <Name>Civil War</Name>
//!   <NumIssues>2</NumIssues>
//!   <Books>
//!     <Book Series="Civil War" Number="1" Volume="2006" Year="2006">
//!       <Database Name="cv" Series="18023" Issue="105837"/>
//!     </Book>
//!   </Books>
//! </ReadingList>
//! ```
//!
//! Elements are matched by local name, so a default namespace on the root
//! element is transparent.

use crate::domain::model::{BookDescriptor, CblData};
use crate::utils::error::{ReadingListError, Result};
use crate::utils::validation::has_extension;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// 讀取並解析磁碟上的 `.cbl` 檔案
pub fn parse_cbl_file<P: AsRef<Path>>(path: P) -> Result<CblData> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ReadingListError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if !has_extension(path, "cbl") {
        return Err(ReadingListError::parse(format!(
            "File must have .cbl extension: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let content = String::from_utf8(bytes)
        .map_err(|e| ReadingListError::parse(format!("Failed to parse XML file: {}", e)))?;

    tracing::debug!("Parsing CBL file {}", path.display());
    parse_cbl_str(&content)
}

#[derive(Default)]
struct PendingBook {
    series: String,
    number: String,
    volume: String,
    year: String,
    order: i64,
    database: Option<(String, String, String)>,
}

impl PendingBook {
    fn into_descriptor(self) -> Option<BookDescriptor> {
        let (database_name, database_series_id, database_issue_id) = self.database?;
        Some(BookDescriptor {
            series: self.series,
            number: self.number,
            volume: self.volume,
            year: self.year,
            database_name,
            database_series_id,
            database_issue_id,
            order: self.order,
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    Name,
    NumIssues,
}

/// 解析記憶體中的 CBL 文件
pub fn parse_cbl_str(xml: &str) -> Result<CblData> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // 目前開啟中的元素（local name）
    let mut stack: Vec<String> = Vec::new();
    let mut saw_root = false;

    let mut name: Option<String> = None;
    let mut num_issues_text: Option<String> = None;
    let mut saw_books = false;
    // 只讀取第一個 Books 區塊
    let mut in_first_books = false;
    let mut text_target: Option<TextTarget> = None;

    let mut position: i64 = 0;
    let mut pending: Option<PendingBook> = None;
    let mut books = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            ReadingListError::parse(format!(
                "Failed to parse XML file at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = local_name(e);

                if stack.is_empty() {
                    if saw_root {
                        return Err(ReadingListError::parse(
                            "Failed to parse XML file: multiple root elements",
                        ));
                    }
                    saw_root = true;
                } else if stack.len() == 1 {
                    match local.as_str() {
                        "Name" if name.is_none() => text_target = Some(TextTarget::Name),
                        "NumIssues" if num_issues_text.is_none() => {
                            text_target = Some(TextTarget::NumIssues)
                        }
                        "Books" if !saw_books => {
                            saw_books = true;
                            in_first_books = !is_empty;
                        }
                        _ => {}
                    }
                    if is_empty {
                        text_target = None;
                    }
                } else if stack.len() == 2 && in_first_books && local == "Book" {
                    position += 1;
                    let mut book = PendingBook {
                        order: position,
                        ..PendingBook::default()
                    };
                    for (key, value) in read_attributes(e)? {
                        match key.as_str() {
                            "Series" => book.series = value,
                            "Number" => book.number = value,
                            "Volume" => book.volume = value,
                            "Year" => book.year = value,
                            _ => {}
                        }
                    }
                    if is_empty {
                        // 沒有 Database 子元素的 Book 無法對應，只佔用位置
                        tracing::debug!("Book at position {} has no Database element", position);
                    } else {
                        pending = Some(book);
                    }
                } else if stack.len() == 3 && stack[2] == "Book" && local == "Database" {
                    if let Some(book) = pending.as_mut() {
                        if book.database.is_none() {
                            let mut db_name = String::new();
                            let mut db_series = String::new();
                            let mut db_issue = String::new();
                            for (key, value) in read_attributes(e)? {
                                match key.as_str() {
                                    "Name" => db_name = value.to_lowercase(),
                                    "Series" => db_series = value,
                                    "Issue" => db_issue = value,
                                    _ => {}
                                }
                            }
                            book.database = Some((db_name, db_series, db_issue));
                        }
                    }
                }

                if !is_empty {
                    stack.push(local);
                }
            }
            Event::Text(e) => {
                if let Some(target) = text_target {
                    let text = e
                        .unescape()
                        .map_err(|err| ReadingListError::parse(format!("Invalid text: {}", err)))?;
                    append_text(target, &text, &mut name, &mut num_issues_text);
                }
            }
            Event::CData(e) => {
                if let Some(target) = text_target {
                    let raw = e.into_inner();
                    let text = String::from_utf8_lossy(&raw);
                    append_text(target, &text, &mut name, &mut num_issues_text);
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                if stack.len() == 1 {
                    text_target = None;
                    if closed.as_deref() == Some("Books") {
                        in_first_books = false;
                    }
                }
                if stack.len() == 2 && closed.as_deref() == Some("Book") {
                    if let Some(book) = pending.take() {
                        match book.into_descriptor() {
                            Some(descriptor) => books.push(descriptor),
                            None => tracing::debug!("Book without Database element dropped"),
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ReadingListError::parse(
            "Failed to parse XML file: no root element",
        ));
    }
    if !stack.is_empty() {
        return Err(ReadingListError::parse(
            "Failed to parse XML file: unexpected end of document",
        ));
    }

    let name = match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            return Err(ReadingListError::parse(
                "CBL file missing required 'Name' element",
            ))
        }
    };

    if !saw_books {
        return Err(ReadingListError::parse(
            "CBL file missing required 'Books' element",
        ));
    }

    let num_issues = match num_issues_text {
        Some(text) => text.trim().parse::<i64>().map_err(|_| {
            ReadingListError::parse(format!("Invalid NumIssues value: '{}'", text))
        })?,
        None => 0,
    };

    if num_issues != position {
        tracing::debug!(
            "NumIssues ({}) does not match Book count ({}) in '{}'",
            num_issues,
            position,
            name
        );
    }

    Ok(CblData {
        name,
        num_issues,
        books,
    })
}

fn append_text(
    target: TextTarget,
    text: &str,
    name: &mut Option<String>,
    num_issues: &mut Option<String>,
) {
    let slot = match target {
        TextTarget::Name => name,
        TextTarget::NumIssues => num_issues,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn read_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr in element.attributes() {
        let attr =
            attr.map_err(|e| ReadingListError::parse(format!("Invalid attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ReadingListError::parse(format!("Invalid attribute value: {}", e)))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(attributes)
}
