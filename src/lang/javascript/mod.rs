//! JavaScript language module.

mod grammar;
mod tokens;

use crate::parse::{Language, TokenParser};

pub struct JavaScript;

impl Language for JavaScript {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "mjs"]
    }

    fn start_parser(&self) -> Box<dyn TokenParser> {
        Box::new(grammar::JsParser::new())
    }

    fn electric_chars(&self) -> &'static str {
        "}]"
    }
}
