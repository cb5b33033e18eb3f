/// Encoding, decoding and error ordering of the binary codec.
pub mod codec;
