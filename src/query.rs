use mongodb::bson::{Document, doc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{Account, BioDataType};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_MIN_AGE: i64 = 18;
pub const DEFAULT_MAX_AGE: i64 = 99;

/// BioDataQuery
///
/// Raw query parameters of `GET /users-bio-data`. Numbers arrive as strings and are
/// parsed leniently: a missing, unparsable or zero value falls back to its default.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BioDataQuery {
    /// Exact match on `bioData.bioDataType` ("Male" / "Female").
    pub gender: Option<String>,
    /// Exact match on `bioData.presentDivision`.
    pub division: Option<String>,
    /// Inclusive lower age bound (default 18).
    pub min_age: Option<String>,
    /// Inclusive upper age bound (default 99).
    pub max_age: Option<String>,
    /// 1-indexed page number (default 1).
    pub page: Option<String>,
    /// Page size (default 10, clamped to the configured maximum).
    pub limit: Option<String>,
}

/// UserSearchQuery
///
/// Query parameters of `GET /admin/manage-users`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    /// Case-insensitive substring of the account name.
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Pagination
///
/// A resolved `(skip, limit)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

/// build_pagination
///
/// `skip = (page - 1) * limit`. Pages below 1 are treated as page 1 and the limit never
/// exceeds `max_page_size`.
pub fn build_pagination(page: Option<&str>, limit: Option<&str>, max_page_size: u64) -> Pagination {
    let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
    let limit = parse_positive(limit)
        .unwrap_or(DEFAULT_LIMIT)
        .min(max_page_size.max(1));

    Pagination {
        skip: (page - 1).saturating_mul(limit),
        limit,
    }
}

/// BioDataFilter
///
/// The structured filter behind the biodata listing. Every condition is AND-ed with
/// the base condition that the account has a `bioData` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioDataFilter {
    pub gender: Option<String>,
    pub division: Option<String>,
    pub min_age: i64,
    pub max_age: i64,
}

impl Default for BioDataFilter {
    fn default() -> Self {
        Self {
            gender: None,
            division: None,
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// build_bio_data_filter
pub fn build_bio_data_filter(params: &BioDataQuery) -> BioDataFilter {
    BioDataFilter {
        gender: non_empty(params.gender.as_deref()),
        division: non_empty(params.division.as_deref()),
        min_age: parse_int(params.min_age.as_deref()).unwrap_or(DEFAULT_MIN_AGE),
        max_age: parse_int(params.max_age.as_deref()).unwrap_or(DEFAULT_MAX_AGE),
    }
}

impl BioDataQuery {
    pub fn pagination(&self, max_page_size: u64) -> Pagination {
        build_pagination(self.page.as_deref(), self.limit.as_deref(), max_page_size)
    }
}

impl BioDataFilter {
    /// Renders the filter as a MongoDB query document. Top-level keys are implicitly AND-ed.
    pub fn to_document(&self) -> Document {
        let mut filter = doc! { "bioData": { "$exists": true } };
        if let Some(gender) = &self.gender {
            filter.insert("bioData.bioDataType", gender.as_str());
        }
        if let Some(division) = &self.division {
            filter.insert("bioData.presentDivision", division.as_str());
        }
        filter.insert(
            "bioData.age",
            doc! { "$gte": self.min_age, "$lte": self.max_age },
        );
        filter
    }

    /// Evaluates the same conditions against an in-memory account.
    pub fn matches(&self, account: &Account) -> bool {
        let Some(bio) = &account.bio_data else {
            return false;
        };
        if let Some(gender) = &self.gender {
            if bio.bio_data_type.map(|t| t.as_str()) != Some(gender.as_str()) {
                return false;
            }
        }
        if let Some(division) = &self.division {
            if bio.present_division.as_deref() != Some(division.as_str()) {
                return false;
            }
        }
        match bio.age {
            Some(age) => (self.min_age..=self.max_age).contains(&i64::from(age)),
            None => false,
        }
    }
}

/// SimilarBioData
///
/// Profiles of the same type as a given person, excluding the person's own biodata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarBioData {
    pub bio_data_type: BioDataType,
    pub exclude_bio_data_id: Option<i64>,
}

impl SimilarBioData {
    pub fn to_document(&self) -> Document {
        doc! {
            "bioData.bioDataType": self.bio_data_type.as_str(),
            "bioData.bioDataId": { "$ne": self.exclude_bio_data_id },
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        account.bio_data.as_ref().is_some_and(|bio| {
            bio.bio_data_type == Some(self.bio_data_type)
                && bio.bio_data_id != self.exclude_bio_data_id
        })
    }
}

/// UserSearch
///
/// Free-text name search used by admin user management. An empty or absent term
/// matches every account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSearch {
    pub term: Option<String>,
}

pub fn build_user_search(params: &UserSearchQuery) -> UserSearch {
    UserSearch {
        term: non_empty(params.q.as_deref()),
    }
}

impl UserSearchQuery {
    pub fn pagination(&self, max_page_size: u64) -> Pagination {
        build_pagination(self.page.as_deref(), self.limit.as_deref(), max_page_size)
    }
}

impl UserSearch {
    /// The term is regex-escaped, so it always matches as a literal substring.
    pub fn to_document(&self) -> Document {
        match &self.term {
            Some(term) => doc! { "name": { "$regex": escape_regex(term), "$options": "i" } },
            None => Document::new(),
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        match &self.term {
            None => true,
            Some(term) => account
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase())),
        }
    }
}

fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parses an integer, treating zero like an absent value.
fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n != 0)
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    parse_int(raw).map(|n| n.max(1) as u64)
}
