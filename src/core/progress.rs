/// One update from the migration worker, carrying display-ready text.
///
/// The worker writes its own prefixes into `text` ("✓ ", "Warning: ",
/// "Error: "), the same strings a user should see. `percent` is present on
/// events that advance the pipeline and is monotonically non-decreasing;
/// free-form notes leave it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub text: String,
    pub is_error: bool,
    pub percent: Option<u8>,
}

/// Capacity of the worker-to-owner channel. The worker awaits when the owner
/// falls this far behind; events are never dropped or reordered.
pub const PROGRESS_CAPACITY: usize = 64;
