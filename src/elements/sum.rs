// src/elements/sum.rs

use anyhow::bail;
use serde_json::{Number, Value};

use crate::element::{Element, ElementContext, ElementLogic, LogicFuture, Outcome};

/// Adds up every input. Integer inputs give an integer result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Sum {
    pub const TYPE_NAME: &'static str = "sum";

    pub fn element() -> Element {
        Element::new(Sum)
    }
}

fn total(inputs: impl Iterator<Item = (String, Value)>) -> anyhow::Result<Value> {
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut all_ints = true;

    for (attribute, value) in inputs {
        let Value::Number(n) = &value else {
            bail!("input '{attribute}' is not a number: {value}");
        };
        match n.as_i64() {
            Some(i) if all_ints => match int_total.checked_add(i) {
                Some(t) => int_total = t,
                None => {
                    all_ints = false;
                    float_total = int_total as f64 + i as f64;
                }
            },
            _ => {
                if all_ints {
                    all_ints = false;
                    float_total = int_total as f64;
                }
                float_total += n.as_f64().unwrap_or(0.0);
            }
        }
    }

    if all_ints {
        return Ok(Value::from(int_total));
    }
    Number::from_f64(float_total)
        .map(Value::Number)
        .ok_or_else(|| anyhow::anyhow!("sum is not a finite number"))
}

impl ElementLogic for Sum {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn execute(&self, ctx: ElementContext) -> LogicFuture {
        let inputs: Vec<(String, Value)> = ctx
            .inputs()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Box::pin(async move { Ok(Outcome::finish(total(inputs.into_iter())?)) })
    }
}
