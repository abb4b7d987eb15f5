//! Request, response and row types for the bridge.

pub mod customer;
pub mod order;
pub mod session;

pub use customer::{CreateCustomerRequest, Customer, CustomerCreated, NewCustomer};
pub use order::{CreateOrderRequest, NewOrder, Order, OrderCreated, OrderView};
pub use session::keys as session_keys;
