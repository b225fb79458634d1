pub mod balances;
pub mod council;
pub mod forum;
pub mod members;
pub mod stakes;
pub mod validators;
pub mod workers;

pub use balances::{BalanceOptions, BalancesPipeline};
pub use council::CouncilPipeline;
pub use forum::ForumPipeline;
pub use members::MembersPipeline;
pub use validators::ValidatorsPipeline;
pub use workers::WorkersPipeline;
