pub mod comments;
pub mod communities;
pub mod media;
pub mod moderation;
pub mod notifications;
pub mod posts;
pub mod sse;
pub mod users;
pub mod votes;

use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(PageQuery::default().bounds(), (20, 0));
        let q = PageQuery {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(q.bounds(), (100, 0));
        let q = PageQuery {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(q.bounds(), (1, 40));
    }
}
