//! Source events and batch statistics.
//!
//! A [`SourceEvent`] is one record observed from the upstream data source
//! (for example a transaction in a block). Events are immutable once
//! collected and carry a content hash that downstream stages use as a
//! stable seed.

use serde::{Deserialize, Serialize};

/// One observed external record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    /// Sequence number (block number) of the record.
    pub sequence: u64,
    /// Hash of the parent sequence entry.
    pub parent_hash: String,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// "Cost" field (gas price in wei); drives tempo and energy.
    pub cost: f64,
    /// "Flow" field (gas used); drives volume and filtering.
    pub flow: f64,
    /// Origin identifier (sender address).
    pub origin: String,
    /// Destination identifier (recipient address).
    pub destination: String,
    /// Value amount as a decimal string.
    pub value: String,
    /// Optional payload bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
    /// BLAKE3 hash over the fields above (see [`SourceEvent::compute_content_hash`]).
    pub content_hash: String,
}

impl SourceEvent {
    /// Creates a builder for a source event.
    pub fn builder(sequence: u64, origin: impl Into<String>) -> SourceEventBuilder {
        SourceEventBuilder::new(sequence, origin)
    }

    /// Computes the content hash from the event's fields.
    ///
    /// Fields are joined with `|` in declaration order; floats use their
    /// bit patterns so the hash does not depend on decimal formatting.
    pub fn compute_content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.sequence.to_le_bytes());
        hasher.update(b"|");
        hasher.update(self.parent_hash.as_bytes());
        hasher.update(b"|");
        hasher.update(&self.timestamp.to_le_bytes());
        hasher.update(b"|");
        hasher.update(&self.cost.to_bits().to_le_bytes());
        hasher.update(b"|");
        hasher.update(&self.flow.to_bits().to_le_bytes());
        hasher.update(b"|");
        hasher.update(self.origin.as_bytes());
        hasher.update(b"|");
        hasher.update(self.destination.as_bytes());
        hasher.update(b"|");
        hasher.update(self.value.as_bytes());
        hasher.update(b"|");
        if let Some(ref payload) = self.payload {
            hasher.update(payload);
        }
        format!("0x{}", hasher.finalize().to_hex())
    }

    /// Returns true if the stored content hash matches the fields.
    pub fn verify_content_hash(&self) -> bool {
        self.content_hash == self.compute_content_hash()
    }
}

/// Builder for [`SourceEvent`] that fills in the content hash on `build()`.
#[derive(Debug, Clone)]
pub struct SourceEventBuilder {
    event: SourceEvent,
}

impl SourceEventBuilder {
    /// Creates a new builder with zeroed numeric fields.
    pub fn new(sequence: u64, origin: impl Into<String>) -> Self {
        Self {
            event: SourceEvent {
                sequence,
                parent_hash: String::new(),
                timestamp: 0,
                cost: 0.0,
                flow: 0.0,
                origin: origin.into(),
                destination: String::new(),
                value: "0".to_string(),
                payload: None,
                content_hash: String::new(),
            },
        }
    }

    /// Sets the parent hash.
    pub fn parent_hash(mut self, parent_hash: impl Into<String>) -> Self {
        self.event.parent_hash = parent_hash.into();
        self
    }

    /// Sets the timestamp (unix seconds).
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    /// Sets the cost field.
    pub fn cost(mut self, cost: f64) -> Self {
        self.event.cost = cost;
        self
    }

    /// Sets the flow field.
    pub fn flow(mut self, flow: f64) -> Self {
        self.event.flow = flow;
        self
    }

    /// Sets the destination identifier.
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.event.destination = destination.into();
        self
    }

    /// Sets the value amount.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.event.value = value.into();
        self
    }

    /// Sets the payload bytes.
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.event.payload = Some(payload);
        self
    }

    /// Builds the event, computing its content hash.
    pub fn build(mut self) -> SourceEvent {
        self.event.content_hash = self.event.compute_content_hash();
        self.event
    }
}

/// Aggregate statistics over an event batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of events in the batch.
    pub count: usize,
    /// Mean of the cost field.
    pub average_cost: f64,
    /// Population standard deviation of the cost field.
    pub cost_std_dev: f64,
    /// Mean of the flow field.
    pub average_flow: f64,
}

impl BatchStats {
    /// Computes statistics for a batch. An empty batch yields all zeros.
    pub fn from_events(events: &[SourceEvent]) -> Self {
        if events.is_empty() {
            return Self {
                count: 0,
                average_cost: 0.0,
                cost_std_dev: 0.0,
                average_flow: 0.0,
            };
        }

        let n = events.len() as f64;
        let average_cost = events.iter().map(|e| e.cost).sum::<f64>() / n;
        let variance = events
            .iter()
            .map(|e| (e.cost - average_cost).powi(2))
            .sum::<f64>()
            / n;
        let average_flow = events.iter().map(|e| e.flow).sum::<f64>() / n;

        Self {
            count: events.len(),
            average_cost,
            cost_std_dev: variance.sqrt(),
            average_flow,
        }
    }

    /// Coefficient of variation of the cost field (std dev / mean).
    ///
    /// Returns 0 when the mean is zero.
    pub fn cost_coefficient_of_variation(&self) -> f64 {
        if self.average_cost.abs() < f64::EPSILON {
            0.0
        } else {
            self.cost_std_dev / self.average_cost
        }
    }

    /// Aggregate activity used to detect changes between batches.
    pub fn activity(&self) -> f64 {
        self.average_cost + self.average_flow
    }

    /// Relative change of cost and flow against a previous batch.
    ///
    /// The larger of the two relative changes is returned, so a batch whose
    /// cost is stable but whose volume doubled still counts as a change.
    pub fn relative_change(&self, previous: &BatchStats) -> f64 {
        fn rel(current: f64, previous: f64) -> f64 {
            if previous.abs() < f64::EPSILON {
                if current.abs() < f64::EPSILON {
                    0.0
                } else {
                    1.0
                }
            } else {
                ((current - previous) / previous).abs()
            }
        }
        rel(self.average_cost, previous.average_cost)
            .max(rel(self.average_flow, previous.average_flow))
    }
}
