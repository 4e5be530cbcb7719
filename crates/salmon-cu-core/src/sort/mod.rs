pub mod execute;
pub mod plan;
pub mod rules;

pub use execute::{execute_plan, MoveMethod, MoveOutcome, MoveRecord, SkipReason};
pub use plan::{build_plan, destination_folder_name, PlanEntry, PlanSummary};
pub use rules::{classify, Rule, RuleTable};
