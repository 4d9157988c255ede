pub mod aggregate;
pub mod gateway;
pub mod normalize;
pub mod sources;
pub mod view;
