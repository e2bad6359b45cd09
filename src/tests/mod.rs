//! Cross-module tests: HTTP request in, LLM call out.

mod consultation_flow_test;
