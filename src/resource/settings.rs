//! Construction settings of stores and batches.

use crate::resource::UsageHint;

/// Settings of a [`DynamicVertexStore`](crate::resource::DynamicVertexStore).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreSettings {
    /// Number of floats allocated up front. Must be non-zero.
    pub initial_capacity: usize,
    /// Usage hint of the vertex buffer.
    pub usage: UsageHint,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            initial_capacity: 1024,
            usage: UsageHint::DynamicDraw,
        }
    }
}

impl StoreSettings {
    /// Sets the initial capacity, in floats.
    pub fn with_initial_capacity(mut self, floats: usize) -> Self {
        self.initial_capacity = floats;
        self
    }

    /// Sets the usage hint.
    pub fn with_usage(mut self, usage: UsageHint) -> Self {
        self.usage = usage;
        self
    }
}

/// Settings of a [`Batch`](crate::resource::Batch).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchSettings {
    /// Usage hint of the three batch buffers.
    pub usage: UsageHint,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            usage: UsageHint::StreamDraw,
        }
    }
}
