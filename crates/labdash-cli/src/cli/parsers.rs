use labdash_core::models::{Category, Level, TrendRange};

pub(super) fn parse_category(raw: &str) -> std::result::Result<Category, String> {
    raw.parse::<Category>()
}

pub(super) fn parse_level(raw: &str) -> std::result::Result<Level, String> {
    raw.parse::<Level>()
}

// Unlike the web query, an unknown range on the command line is rejected.
pub(super) fn parse_trend_range(raw: &str) -> std::result::Result<TrendRange, String> {
    raw.parse::<TrendRange>()
}
