use serde::Serialize;
use std::fmt;

/// Rows per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 7;

/// Upper bound for the size filter, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxSize {
    One,
    Five,
    #[default]
    Ten,
}

impl MaxSize {
    pub const ALL: [MaxSize; 3] = [MaxSize::Ten, MaxSize::Five, MaxSize::One];

    pub fn megabytes(self) -> u8 {
        match self {
            MaxSize::One => 1,
            MaxSize::Five => 5,
            MaxSize::Ten => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaxSize::One => "Less than 1 MB",
            MaxSize::Five => "Less than 5 MB",
            MaxSize::Ten => "Less than 10 MB",
        }
    }
}

impl TryFrom<u8> for MaxSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MaxSize::One),
            5 => Ok(MaxSize::Five),
            10 => Ok(MaxSize::Ten),
            other => Err(format!("Unsupported size filter: {} MB", other)),
        }
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.megabytes())
    }
}

/// Listing parameters owned by the listing controller.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub filename_filter: String,
    pub max_size: MaxSize,
    pub page: u32,
    pub page_size: u32,
}

impl QueryState {
    pub fn new(page_size: u32) -> Self {
        Self {
            filename_filter: String::new(),
            max_size: MaxSize::default(),
            page: 1,
            page_size,
        }
    }

    pub fn to_params(&self) -> ListFilesParams<'_> {
        ListFilesParams {
            filename: &self.filename_filter,
            size: self.max_size.megabytes(),
            page: self.page,
            limit: self.page_size,
        }
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Query string of `GET /api/files`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ListFilesParams<'a> {
    pub filename: &'a str,
    pub size: u8,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_filter_accepts_only_known_bounds() {
        assert_eq!(MaxSize::try_from(1), Ok(MaxSize::One));
        assert_eq!(MaxSize::try_from(5), Ok(MaxSize::Five));
        assert_eq!(MaxSize::try_from(10), Ok(MaxSize::Ten));
        assert!(MaxSize::try_from(3).is_err());
    }

    #[test]
    fn default_query_starts_on_first_page_with_widest_filter() {
        let query = QueryState::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.max_size, MaxSize::Ten);
        assert_eq!(
            query.to_params(),
            ListFilesParams {
                filename: "",
                size: 10,
                page: 1,
                limit: 7
            }
        );
    }
}
