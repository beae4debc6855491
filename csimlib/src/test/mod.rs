mod cache_tests;
mod trace_tests;
