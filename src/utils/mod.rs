// Shared helpers: byte-level readers and text decoding
pub mod encoding;
pub mod io;
