//! Embedded SQL migrations

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All migrations, in application order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_rule_store",
            sql: include_str!("../../migrations/001_rule_store.sql"),
        },
        Migration {
            id: "002_managed_state",
            sql: include_str!("../../migrations/002_managed_state.sql"),
        },
    ]
}
