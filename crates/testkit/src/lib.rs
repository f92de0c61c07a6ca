//! Fixture tooling shared by quarry's dialect crates and any integration
//! test that wants to assert compiled SQL shape without a live database
//! connection.

pub mod yaml_runner;

pub use yaml_runner::{
    load_fixtures_from_str, run_select_fixture, FixtureParseError, FixtureValue, QueryFixture,
    TestResult, WhereFixture,
};
