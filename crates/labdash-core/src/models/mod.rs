mod diff;
mod platform;
mod summary;
mod test_log;
mod trend;

pub use diff::{DiffEntry, DiffReport, DiffResult, DiffStats};
pub use platform::{CurrentPlatform, PlatformSource, PregenerateReport};
pub use summary::{
    BucketKey, BucketMap, Category, Level, LevelStats, Notes, Summary, TestCounts, TestItem,
    TestOutcome, TestTimes, VersionInfo,
};
pub use test_log::{LogStatus, TestLogDetail, TestLogPreview};
pub use trend::{BucketTrendPoint, OverallTrendPoint, TrendPoint, TrendRange};
