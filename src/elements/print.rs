// src/elements/print.rs

use std::io::Write;

use serde_json::Value;

use crate::element::{Element, ElementContext, ElementLogic, LogicFuture, Outcome};

/// Writes each input as `name = value` to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Print;

impl Print {
    pub const TYPE_NAME: &'static str = "print";

    pub fn element() -> Element {
        Element::new(Print)
    }
}

impl ElementLogic for Print {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn execute(&self, ctx: ElementContext) -> LogicFuture {
        let lines: Vec<String> = ctx
            .inputs()
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();
        Box::pin(async move {
            let mut out = std::io::stdout().lock();
            for line in lines {
                writeln!(out, "{line}")?;
            }
            Ok(Outcome::finish(Value::Null))
        })
    }
}
