use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 分页查询参数
///
/// 通过 `#[serde(flatten)]` 嵌入时查询串的值全部以字符串到达，故两种形式都接受。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationQuery {
    #[serde(default = "default_page", deserialize_with = "lenient_i64")]
    pub page: i64,
    #[serde(default = "default_size", deserialize_with = "lenient_i64")]
    pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid integer: {text}"))),
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;

    #[derive(Deserialize)]
    struct Wrapped {
        #[serde(flatten)]
        pagination: PaginationQuery,
        search: Option<String>,
    }

    #[test]
    fn test_query_string_values_parse() {
        let wrapped = Query::<Wrapped>::from_query("page=3&size=25&search=alpha")
            .unwrap()
            .into_inner();
        assert_eq!(wrapped.pagination.page, 3);
        assert_eq!(wrapped.pagination.size, 25);
        assert_eq!(wrapped.search.as_deref(), Some("alpha"));

        let defaults = Query::<Wrapped>::from_query("").unwrap().into_inner();
        assert_eq!(defaults.pagination.page, 1);
        assert_eq!(defaults.pagination.size, DEFAULT_PAGE_SIZE);

        assert!(Query::<Wrapped>::from_query("page=abc").is_err());
    }
}
