pub mod txt;

pub use txt::TxtCodec;
