pub mod asi;
pub mod codec;
pub mod config;
pub mod consts;
pub mod corpus;
pub mod error;
pub mod hypergeo;
pub mod nbac;
pub mod normalize;
