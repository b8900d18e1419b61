// src/elements/constant.rs

use serde_json::Value;

use crate::element::{Element, ElementContext, ElementLogic, LogicFuture, Outcome};
use crate::errors::Result;

/// Finishes with its `value` variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Constant;

impl Constant {
    pub const TYPE_NAME: &'static str = "constant";

    pub fn element(value: impl Into<Value>) -> Result<Element> {
        Element::new(Constant).with_variable("value", value)
    }
}

impl ElementLogic for Constant {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn execute(&self, ctx: ElementContext) -> LogicFuture {
        let value = ctx.variable("value").cloned().unwrap_or(Value::Null);
        Box::pin(async move { Ok(Outcome::finish(value)) })
    }
}
