pub mod attribute;
pub mod ci;
pub mod client;
pub mod error;
pub mod jwt;
pub mod layer;
pub mod relation;
pub mod token;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
