//! Library integration tests.

mod presets_tests;
