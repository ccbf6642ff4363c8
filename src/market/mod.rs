pub mod alignment;
pub mod benchmark;
pub mod ladder;
pub mod stress;

pub use alignment::{MarketAlignmentAnalyzer, MarketAlignmentResult, TopDemandSkill};
pub use benchmark::{
    HiringCompany, MarketBenchmarkResolver, MarketBenchmarkSnapshot, QueryMode, ResolvedBenchmark,
    TrendLabel,
};
pub use ladder::{Attempt, run_ladder};
pub use stress::{MarketStressOrchestrator, RepoProofReport, StressTestResult};
