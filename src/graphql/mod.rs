use async_graphql::{EmptySubscription, Schema};
use mongodb::Database;
use sqlx::PgPool;

use crate::graphql::mutation::MutationRoot;
use crate::graphql::query::QueryRoot;

pub mod guards;
pub mod mutation;
pub mod query;

pub const SUCCESS_MESSAGE: &str = "success";

pub type CcaSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema once, sharing both stores with every request
pub fn build_schema(pool: PgPool, database: Database) -> CcaSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(pool)
        .data(database)
        .finish()
}
