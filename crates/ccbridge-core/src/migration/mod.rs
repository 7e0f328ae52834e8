//! Migration of entities from the source platform to the target platform.
//!
//! A batch runs sequentially in source fetch order:
//!
//! 1. Fetch the source entities of one type and apply the optional id filter.
//! 2. Fetch the target entity set once and reconcile each source entity.
//! 3. Skip duplicates, simulate (dry run) or create the rest.
//!
//! | Outcome | `targetId` | Target mutated |
//! |---------|------------|----------------|
//! | `migrated` | new id | yes |
//! | `simulated` | none | no |
//! | `skipped_duplicate` | none (`matchedTargetId` set) | no |
//! | `failed` | none | no |
//!
//! Overlapping calls for the same source org, target environment and entity
//! type are serialized by an advisory lock. Re-running a successful batch is
//! idempotent because the reconciler finds every previously created entity.
//!
//! # Example
//!
//! ```ignore
//! let executor = MigrationExecutor::new(source, target, LockRegistry::new(), EngineConfig::default());
//! let req = MigrateRequest::new(EntityType::User, "org-1", "env-1").dry_run();
//! let result = executor.migrate(&req, &CancellationToken::new()).await?;
//! println!("{} would be created", result.summary.successful);
//! ```

pub mod artifacts;
pub mod executor;
pub mod lock;
pub mod request;
pub mod result;

pub use artifacts::{ContextVariable, FlowArtifactOptions, ImportManifest, RoutingRuleStub};
pub use executor::MigrationExecutor;
pub use lock::{LockGuard, LockKey, LockRegistry};
pub use request::{CompareRequest, MigrateRequest};
pub use result::{BatchSummary, ItemStatus, MigrationBatchResult, MigrationItemResult};
