//! Route registration: parameters, controllers and the route table

pub mod params;
pub mod setting;
pub mod table;

pub use params::RouteParameters;
pub use setting::{AuthPolicy, Setting};
pub use table::{join_paths, Controller, RouteInfo, RouteTable};
