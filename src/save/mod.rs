pub mod checkpoint;
pub mod meta;

pub use checkpoint::latest;
pub use checkpoint::load;
pub use checkpoint::resume;
pub use checkpoint::save;
pub use meta::DiscountState;
pub use meta::Meta;
