use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;
pub type IssueId = i64;
pub type ListId = i64;
pub type ItemId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// 目錄中的期刊記錄（唯讀）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    #[serde(default)]
    pub cv_id: Option<i64>,
    pub series_id: i64,
    pub series_name: String,
    pub number: String,
    #[serde(default)]
    pub cover_date: Option<NaiveDate>,
    #[serde(default)]
    pub arc_ids: Vec<i64>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.series_name, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributionSource {
    Cbro,
    Cmro,
    Cbh,
    Cbt,
    Mg,
    Htlc,
    Locg,
    Other,
}

impl AttributionSource {
    /// 將來源代碼對應到列舉；未知或空白代碼回傳 None
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CBRO" => Some(Self::Cbro),
            "CMRO" => Some(Self::Cmro),
            "CBH" => Some(Self::Cbh),
            "CBT" => Some(Self::Cbt),
            "MG" => Some(Self::Mg),
            "HTLC" => Some(Self::Htlc),
            "LOCG" | "LoCG" => Some(Self::Locg),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Cbro => "CBRO",
            Self::Cmro => "CMRO",
            Self::Cbh => "CBH",
            Self::Cbt => "CBT",
            Self::Mg => "MG",
            Self::Htlc => "HTLC",
            Self::Locg => "LOCG",
            Self::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cbro => "Comic Book Reading Orders",
            Self::Cmro => "Complete Marvel Reading Orders",
            Self::Cbh => "Comic Book Herald",
            Self::Cbt => "Comic Book Treasury",
            Self::Mg => "Marvel Guides",
            Self::Htlc => "How To Love Comics",
            Self::Locg => "League of ComicGeeks",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Prologue,
    Core,
    TieIn,
    Epilogue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingList {
    pub id: ListId,
    pub owner_id: UserId,
    pub name: String,
    pub slug: String,
    pub is_private: bool,
    #[serde(default)]
    pub attribution_source: Option<AttributionSource>,
    #[serde(default)]
    pub attribution_url: String,
    pub created_on: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl fmt::Display for ReadingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(source) = self.attribution_source {
            write!(f, " ({})", source.label())?;
        }
        Ok(())
    }
}

/// 建立閱讀清單所需的欄位；slug 與時間戳由儲存層產生
#[derive(Debug, Clone, PartialEq)]
pub struct NewReadingList {
    pub owner_id: UserId,
    pub name: String,
    pub is_private: bool,
    pub attribution_source: Option<AttributionSource>,
    pub attribution_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingListItem {
    pub id: ItemId,
    pub list_id: ListId,
    pub issue_id: IssueId,
    pub order: i64,
    #[serde(default)]
    pub issue_type: Option<IssueType>,
}

/// 從 CBL 或 JSON 批次檔讀出的一筆書目描述
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookDescriptor {
    pub series: String,
    pub number: String,
    pub volume: String,
    pub year: String,
    pub database_name: String,
    pub database_series_id: String,
    pub database_issue_id: String,
    pub order: i64,
}

impl fmt::Display for BookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.series.is_empty() {
            write!(f, "{} ID {}", self.database_name, self.database_issue_id)
        } else {
            write!(f, "{} #{}", self.series, self.number)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CblData {
    pub name: String,
    pub num_issues: i64,
    pub books: Vec<BookDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Issue),
    NotFound,
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub reading_list: ReadingList,
    pub issues_added: usize,
    pub issues_not_found: Vec<BookDescriptor>,
    pub issues_skipped: Vec<(BookDescriptor, String)>,
}
