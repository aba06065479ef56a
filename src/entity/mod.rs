pub mod audit_logs;
pub mod cart_items;
pub mod delivery_comments;
pub mod order_items;
pub mod orders;
pub mod pizzas;
pub mod sea_orm_active_enums;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use delivery_comments::Entity as DeliveryComments;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pizzas::Entity as Pizzas;
pub use users::Entity as Users;
