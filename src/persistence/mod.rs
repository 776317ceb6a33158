// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! Versioned document repositories, code sequences and persistence metrics.
//!
//! ## Components
//!
//! - **Repository**: async document storage with compare-and-swap replacement
//! - **InMemoryRepository**: insertion-ordered storage with unique-key enforcement
//! - **CodeAllocator**: sequential `PREFIX-00001` codes
//! - **Store**: the repositories of every entity type, used as reference resolver
//! - **Metrics**: timing and outcome counters via `InstrumentedRepository`

pub mod in_memory;
pub mod instrumented_repository;
pub mod metrics;
pub mod repository;
pub mod sequence;
pub mod store;

pub use in_memory::InMemoryRepository;
pub use instrumented_repository::InstrumentedRepository;
pub use metrics::{DurationStats, MetricsSummary, MetricsTimer, PersistenceMetrics};
pub use repository::{Filter, Repository};
pub use sequence::{format_code, CodeAllocator, InMemoryCodeAllocator};
pub use store::{ensure_exists, Store};
