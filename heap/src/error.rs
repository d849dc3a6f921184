use object::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("heap exhausted: capacity of {capacity} objects reached")]
    Exhausted { capacity: usize },
}

pub type HeapResult<T> = Result<T, HeapError>;
