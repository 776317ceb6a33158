// Copyright 2025 Cowboy AI, LLC.

//! Sequential human-readable codes (`MAT-00001`, `EQ-00001`)

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::errors::DomainResult;

/// Hands out per-prefix sequential codes
#[async_trait]
pub trait CodeAllocator: Send + Sync {
    /// Next code for `prefix`
    async fn next_code(&self, prefix: &str) -> DomainResult<String>;
}

/// Format a code the way the allocators do
pub fn format_code(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:05}")
}

/// Counter-per-prefix allocator
#[derive(Debug, Default)]
pub struct InMemoryCodeAllocator {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryCodeAllocator {
    /// Start every prefix at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue `prefix` after `last` (used when loading existing data)
    pub async fn seed(&self, prefix: &str, last: u64) {
        self.counters.lock().await.insert(prefix.to_string(), last);
    }
}

#[async_trait]
impl CodeAllocator for InMemoryCodeAllocator {
    async fn next_code(&self, prefix: &str) -> DomainResult<String> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        Ok(format_code(prefix, *counter))
    }
}
