//! Service layer: the duplicate-detection and merge-confirmation engine.

pub mod confirmation;
pub mod matcher;
pub mod messages;
pub mod pair_lock;
pub mod sync;
pub mod synthesis;

pub use confirmation::ConfirmationService;
pub use matcher::SimilarityMatcher;
pub use pair_lock::{PairClaim, PairLock};
pub use sync::SyncService;
pub use synthesis::{MergedContent, SynthesisService};
