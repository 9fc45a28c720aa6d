//! End-to-end tests: jobs run through the real pipeline against a fake
//! browser, a recording publisher and stub data feeds.

mod mock_driver;
mod pipeline;
