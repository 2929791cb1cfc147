use serde::{Deserialize, Serialize};

pub const MAX_PAGE_LIMIT: i64 = 200;

/// Limit/offset pagination as exposed on the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self { limit: default_limit(), offset: 0 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = PageParams { limit: 5000, offset: -3 };
        assert_eq!(params.limit(), MAX_PAGE_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = PageParams { limit: 0, offset: 10 };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 10);
    }

    #[test]
    fn defaults_apply() {
        let params = PageParams::default();
        assert_eq!(params.limit(), 50);
        assert_eq!(params.offset(), 0);
    }
}
