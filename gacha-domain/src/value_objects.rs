// Domain value objects
pub mod identifiers;
pub mod item_type;
pub mod pool_category;
pub mod rarity;

pub use identifiers::*;
pub use item_type::*;
pub use pool_category::*;
pub use rarity::*;
