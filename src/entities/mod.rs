//! Domain types: accounts, payment methods and catalog products

pub mod account;
pub mod macros;
pub mod payment;
pub mod product;

pub use account::{Account, AccountProfile, AccountView, NewAccount};
pub use payment::{NewPaymentMethod, PaymentMethod, PaymentMethodView, PaymentWithOwner};
pub use product::{NewProduct, Product};
