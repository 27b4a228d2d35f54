pub mod binding;
pub mod dashboard;
pub mod executor;
pub mod export;
pub mod filter;
pub mod system;
pub mod test_suite;

pub use binding::StandardTests;
pub use dashboard::Dashboard;
pub use executor::run_probe;
pub use export::result_lines;
pub use system::{Navigation, System};
pub use test_suite::TestSuite;
