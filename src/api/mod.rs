//! API response types, pagination, ordering and search utilities

pub mod ordering;
pub mod pagination;
pub mod response;
pub mod schema;
pub mod searching;

pub use ordering::{OrderTerm, Ordering, OrderingParams};
pub use pagination::{
    AbsoluteUrl, LimitOffsetPagination, LimitOffsetParams, PageNumberPagination, PageParams,
};
pub use response::{Created, EnvelopeTemplate, HttpUrl, ItemEnvelope, PaginatedEnvelope};
pub use schema::{DumpOptions, Schema, SchemaRef};
pub use searching::{SearchParams, Searching};
