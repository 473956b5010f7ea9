//! The cursor-paginated, tag-filtered query planner: merges bare
//! transactions and bundled data items into one ordered, paginated stream.

mod cursor_predicate;
mod error;
mod node;
mod planner;
mod source;
mod tags;
mod types;

pub use error::QueryError;
pub use planner::{get_gql_block, get_gql_blocks, get_gql_transaction, get_gql_transactions, get_gql_search_by_tags};
pub use types::{
    BundledIn, Edge, GqlBlockRef, GqlBlocksArgs, GqlTransactionNode, GqlTransactionsArgs, Page, PageInfo,
};
pub use cgw_types::entities::TagMatchMode;
