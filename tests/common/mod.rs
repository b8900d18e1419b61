pub use dagwheel_test_utils::*;

use dagwheel::element::ElementProvider;
use dagwheel::elements::builtin_provider;

use dagwheel_test_utils::logic::FnLogic;

/// Built-ins plus the scripted types used across these tests.
#[allow(dead_code)]
pub fn test_provider() -> ElementProvider {
    builtin_provider()
        .with("recall-twice", || {
            FnLogic::recalling("recall-twice", 2, serde_json::json!("done"))
        })
        .with("stuck", || FnLogic::returning("stuck", serde_json::json!(null)))
}
