pub mod collect;
pub mod keywords;
pub mod normalize;
pub mod report;

pub use collect::{
    CollectFailure, CollectOptions, CollectProgressCallback, StackTally, VacancyRow,
    execute_collect,
};
pub use keywords::{DEFAULT_KEYWORDS, KeywordDictionary, KeywordError, KeywordHits};
pub use normalize::normalize;
pub use report::{ReportFormat, ReportPaths, SummaryRow, generate_top_table, summary_rows};
