//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginatedAdminOrders, PaginationMeta, PaginationParams};
pub use response::{Created, MessageResponse, NoContent};
