pub mod brand;
pub mod order;
pub mod product;
pub mod user;

pub use brand::{Brand, BrandInput};
pub use order::{CreateOrder, CustomerOrder, Order, OrderDisplay, UpdateOrder};
pub use product::{CatalogEntry, CreateProduct, ProductDisplay, UpdateProduct};
pub use user::{Credentials, User, UserResponse};
