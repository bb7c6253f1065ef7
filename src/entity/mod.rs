pub mod audit_logs;
pub mod carts;
pub mod cart_items;
pub mod cars;
pub mod flights;
pub mod hotels;
pub mod order_items;
pub mod orders;
pub mod packages;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use cars::Entity as Cars;
pub use flights::Entity as Flights;
pub use hotels::Entity as Hotels;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use packages::Entity as Packages;
