//! Source-event batch validation.

use crate::error::{ErrorCode, ValidationError, ValidationResult};
use crate::event::SourceEvent;

/// Validates a batch before derivation.
///
/// Checks, in order:
/// - the batch is non-empty (E001)
/// - sequence numbers never decrease, so the batch is most-recent-last (E002)
/// - cost and flow are finite (E003) and non-negative (E004)
/// - each stored content hash matches its fields (E005)
///
/// Events with an empty `content_hash` skip the hash check; some data
/// sources do not precompute it.
///
/// # Example
/// ```
/// use blocktape_spec::{SourceEvent, validation::validate_batch};
///
/// let batch = vec![SourceEvent::builder(1, "0xa").cost(5e9).build()];
/// assert!(validate_batch(&batch).is_ok());
/// assert!(!validate_batch(&[]).is_ok());
/// ```
pub fn validate_batch(events: &[SourceEvent]) -> ValidationResult {
    let mut result = ValidationResult::success();

    if events.is_empty() {
        result.add_error(ValidationError::new(
            ErrorCode::EmptyBatch,
            "event batch is empty",
        ));
        return result;
    }

    for (i, pair) in events.windows(2).enumerate() {
        if pair[1].sequence < pair[0].sequence {
            result.add_error(ValidationError::with_path(
                ErrorCode::OutOfOrder,
                format!(
                    "sequence {} follows {}; batch must be ordered most-recent-last",
                    pair[1].sequence, pair[0].sequence
                ),
                format!("events[{}].sequence", i + 1),
            ));
        }
    }

    for (i, event) in events.iter().enumerate() {
        validate_numeric(&mut result, i, "cost", event.cost);
        validate_numeric(&mut result, i, "flow", event.flow);

        if !event.content_hash.is_empty() && !event.verify_content_hash() {
            result.add_error(ValidationError::with_path(
                ErrorCode::ContentHashMismatch,
                "content hash does not match event fields",
                format!("events[{}].content_hash", i),
            ));
        }
    }

    result
}

fn validate_numeric(result: &mut ValidationResult, index: usize, field: &str, value: f64) {
    let path = format!("events[{}].{}", index, field);
    if !value.is_finite() {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonFiniteField,
            format!("{} must be finite, got {}", field, value),
            path,
        ));
    } else if value < 0.0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::NegativeField,
            format!("{} must be non-negative, got {}", field, value),
            path,
        ));
    }
}
