//! Cross-module retrieval scenarios.

mod retrieval;
