use sfguard_core::{
    analyze_apex_triggers, analyze_naming_conventions, rules::RuleRegistry,
    types::{FieldRecord, TriggerRecord},
};

#[test]
fn analyzers_share_the_builtin_registry_across_threads() {
    let fields: Vec<FieldRecord> = (0..50)
        .map(|i| FieldRecord::new(&format!("field{i}__c")))
        .collect();
    let triggers = vec![TriggerRecord::new(
        "T",
        "if (Trigger_Settings__c.getInstance().Disable__c) return;",
    )];

    let expected_naming = serde_json::to_string(&analyze_naming_conventions(&fields)).unwrap();
    let expected_triggers = serde_json::to_string(&analyze_apex_triggers(&triggers)).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    let registry: &'static RuleRegistry = RuleRegistry::builtin();
                    assert!(!registry.naming_rules().is_empty());
                    (
                        serde_json::to_string(&analyze_naming_conventions(&fields)).unwrap(),
                        serde_json::to_string(&analyze_apex_triggers(&triggers)).unwrap(),
                    )
                })
            })
            .collect();
        for h in handles {
            let (naming, trig) = h.join().unwrap();
            assert_eq!(naming, expected_naming);
            assert_eq!(trig, expected_triggers);
        }
    });
}
