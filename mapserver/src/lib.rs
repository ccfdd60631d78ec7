mod bitmap;
mod client;
mod error;
mod extent;
mod request;

pub use bitmap::{decode, Bitmap};
pub use client::{Client, ClientConfig, MapSource};
pub use error::{Error, Result};
pub use extent::{Extent, ZoomDirection};
pub use request::MapUrl;
