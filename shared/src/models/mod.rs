//! Entity models mirroring the relational schema.

mod acknowledgment;
mod discount_code;
mod notification;
mod order;
mod product;
mod referral;
mod returns;
mod user;

pub use acknowledgment::Acknowledgment;
pub use discount_code::{DiscountCode, DiscountCodeCreate, DiscountCodeUpdate};
pub use notification::NotificationLog;
pub use order::{Order, OrderItem, OrderItemDetail, OrderWithItems};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use referral::ReferralTransaction;
pub use returns::{ReturnItem, ReturnRequest};
pub use user::{User, UserCreate, UserUpdate};
