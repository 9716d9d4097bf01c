//! Rulebase fixtures
//!
//! A fixture is a YAML file that stages the contents of one location: its
//! ordered rules and, optionally, the names a previous pass managed. It is
//! how staging environments and tests set up "remote" state.

pub mod format_v0;
pub mod importer;
pub mod parser;

pub use format_v0::FixtureV0;
pub use importer::{import_fixture, import_fixture_file};
pub use parser::{parse_fixture_file, parse_fixture_str, Fixture};
