mod engine_tests;
mod msp_tests;
mod sharing_tests;
