pub mod decode;
pub mod raster;
pub mod resolve;
pub mod scratch;
