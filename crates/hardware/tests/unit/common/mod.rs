//! Tests for common types shared across the hart, memory, and device layers.
