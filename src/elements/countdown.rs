// src/elements/countdown.rs

use serde_json::Value;

use crate::element::{Element, ElementContext, ElementLogic, LogicFuture, Outcome, Status};
use crate::errors::Result;
use crate::wheel::CycleTable;

/// Polls until `remaining` reaches zero, recalling itself on every poll,
/// then finishes with the number of polls it took.
#[derive(Debug, Clone, Copy, Default)]
pub struct Countdown;

impl Countdown {
    pub const TYPE_NAME: &'static str = "countdown";

    pub fn element(remaining: u64) -> Result<Element> {
        Element::new(Countdown).with_variable("remaining", remaining)
    }
}

impl ElementLogic for Countdown {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn execute(&self, ctx: ElementContext) -> LogicFuture {
        Box::pin(async move {
            let remaining = ctx.variable("remaining").and_then(Value::as_u64).unwrap_or(0);
            let polls = ctx.variable("polls").and_then(Value::as_u64).unwrap_or(0);
            let mut vars = ctx.into_variables();

            if remaining == 0 {
                return Ok(Outcome::finish(polls));
            }
            vars.insert("remaining".to_string(), Value::from(remaining - 1));
            vars.insert("polls".to_string(), Value::from(polls + 1));
            Ok(Outcome::recall().with_variables(vars))
        })
    }

    fn is_recallable(&self) -> bool {
        true
    }

    fn cycles(&self) -> CycleTable {
        CycleTable::new().with_default(1).with_status(Status::Ready, 2)
    }
}
