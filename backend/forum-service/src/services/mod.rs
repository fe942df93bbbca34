/// Business logic layer for forum-service
///
/// This module provides high-level operations:
/// - Classifier: HTTP client for the external text classifier
/// - Moderation: the fail-open gate every text write passes through
/// - Comment service: threaded comments (authorize, moderate, store)
/// - Post service: posts with tag sets and vote tallies
/// - Vote service: the toggling vote ledger
/// - Tag service: case-insensitive tag registry
pub mod classifier;
pub mod comments;
pub mod moderation;
pub mod posts;
pub mod tags;
pub mod votes;

// Re-export commonly used services
pub use classifier::{ClassifierUnavailable, ClassifierVerdict, HttpClassifier, TextClassifier};
pub use comments::CommentService;
pub use moderation::{ModerationDecision, ModerationGate};
pub use posts::{NewPost, PostChanges, PostListQuery, PostService};
pub use tags::TagService;
pub use votes::VoteService;
