use std::sync::Arc;

use bastion_adapters::triggers::{general_triggers, knowledge_triggers, pentest_triggers, tool_triggers};
use bastion_core::config::RouterConfig;
use bastion_core::models::Task;
use bastion_core::traits::ICapabilityAdapter;
use bastion_router::classify;
use proptest::prelude::*;
use test_fixtures::StubAdapter;

fn adapters() -> Vec<Arc<dyn ICapabilityAdapter>> {
    vec![
        Arc::new(StubAdapter::new("pentest_reasoning", pentest_triggers())),
        Arc::new(StubAdapter::new("tool_execution", tool_triggers())),
        Arc::new(StubAdapter::new("general_reasoning", general_triggers())),
        Arc::new(StubAdapter::new("knowledge", knowledge_triggers())),
    ]
}

const WORDS: &[&str] = &[
    "scan", "exploit", "nmap", "threat", "feed", "show", "me", "help", "the", "host", "ports",
    "report", "how", "to", "payload", "osint", "coffee",
];

proptest! {
    #[test]
    fn undeclared_scores_stay_below_one_and_weights_sum_to_one(
        picks in proptest::collection::vec(0..WORDS.len(), 0..12),
        with_target in any::<bool>(),
        threshold in 0.05f64..1.0,
    ) {
        let text = picks.iter().map(|i| WORDS[*i]).collect::<Vec<_>>().join(" ");
        let mut task = Task::new(text);
        if with_target {
            task = task.with_context("target", "10.0.0.1");
        }
        let config = RouterConfig { relevance_threshold: threshold, ..Default::default() };
        let decision = classify(&task, &adapters(), &config);

        for score in decision.classification_scores.values() {
            prop_assert!((0.0..1.0).contains(score));
        }
        prop_assert!(!decision.selections.is_empty());
        let total: f64 = decision.selections.iter().map(|s| s.weight).sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        for pair in decision.selections.windows(2) {
            prop_assert!(pair[0].weight >= pair[1].weight);
        }
        if decision.fallback_used {
            prop_assert_eq!(decision.adapter_names(), vec!["general_reasoning"]);
        } else {
            for s in &decision.selections {
                prop_assert!(decision.score_of(&s.adapter_name).unwrap() >= threshold);
            }
        }
    }
}
