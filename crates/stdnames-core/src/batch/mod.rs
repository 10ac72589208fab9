//! Batch operation engine: typed edit operations, dependency-ordered
//! execution, and atomic/continue failure policies.

mod operation;
mod processor;
mod sort;

pub use operation::{
    BatchDeleteResult, BatchMode, BatchResult, BatchSummary, DeleteResult, ModifyResult,
    Operation, OperationError, OperationResult, OperationStatus, Outcome, RenameResult,
};
pub use processor::{apply_batch, apply_batch_delete, apply_operation};
pub use sort::{dependency_order, CycleError};
