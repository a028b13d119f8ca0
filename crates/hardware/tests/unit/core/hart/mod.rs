//! Tests for per-hart CSR storage, the machine timer, and trap/interrupt delivery.

/// Tests for [`riscv_core::core::hart::csr::CsrBank`] defaults.
pub mod csr;


/// Tests for trap/interrupt delegation, vectoring, and the run loop.
pub mod trap_handling;
