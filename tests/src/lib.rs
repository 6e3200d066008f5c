//! # Quantum-Chain Platform Test Suite
//!
//! End-to-end flows through [`PlatformStateService`](qc_18_platform_state::PlatformStateService)
//! backed by the in-memory repository.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── contracts_and_documents.rs
//!     ├── identities.rs
//!     └── name_service.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! QC_LOG_LEVEL=debug cargo test -p qc-tests integration::identities
//! ```

pub mod integration;
