#![allow(async_fn_in_trait)]
pub mod campaign;
pub mod error;
pub mod export;
pub mod imagery;
pub mod sampling;
pub mod sentinel1;
pub mod stac_operations;
pub mod storage;
pub mod validate;
