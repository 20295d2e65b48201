//! nimdoc — API documentation for Nim modules.
//!
//! An external `nimdocinfo` extractor reports a module's declarations as
//! JSON; nimdoc parses each declaration's doc comment in one of four
//! docstring dialects, merges the result into the extracted records, and
//! renders HTML or JSON.

pub mod collector;
pub mod config;
pub mod docstring;
pub mod enrich;
pub mod error;
pub mod handler;
pub mod model;
pub mod render;

pub use docstring::{
    parse_docstring, DocstringStyle, ParamDoc, ParsedDocstring, RaisesDoc, ReturnsDoc,
};
pub use handler::Handler;
