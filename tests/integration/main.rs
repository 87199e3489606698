//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the full service
//! against the shared mock adapters in `mock_hw`.  All tests run on the
//! host (x86_64) with no real hardware required.

mod controller_tests;
mod menu_tests;
mod mock_hw;
mod power_tests;
