//! Database migrations.
//!
//! Schema migrations for the social core. Tables are created in dependency
//! order so foreign keys always point at an existing table.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_account_table;
mod m20250601_000002_create_profile_table;
mod m20250601_000003_create_post_table;
mod m20250601_000004_create_engagement_tables;
mod m20250601_000005_create_follow_table;
mod m20250601_000006_create_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_account_table::Migration),
            Box::new(m20250601_000002_create_profile_table::Migration),
            Box::new(m20250601_000003_create_post_table::Migration),
            Box::new(m20250601_000004_create_engagement_tables::Migration),
            Box::new(m20250601_000005_create_follow_table::Migration),
            Box::new(m20250601_000006_create_message_table::Migration),
        ]
    }
}
