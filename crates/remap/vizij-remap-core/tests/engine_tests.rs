use vizij_remap_core::{
    config::{CollisionPolicy, Config, ReloadPolicy},
    engine::{DiscardReport, RemapEngine},
    error::RemapError,
    key::{BindingKey, CapturedSet},
    rewrite::RewriteMode,
    store::{CurveStore, MemoryStore},
};

fn key(path: &str, property: &str) -> BindingKey {
    BindingKey::new(path, "Transform", property)
}

/// Store with one value per key, values numbered from 1 in key order.
fn store_for(keys: &[BindingKey]) -> MemoryStore<u32> {
    keys.iter()
        .cloned()
        .zip(1u32..)
        .collect::<MemoryStore<u32>>()
}

fn contents(store: &MemoryStore<u32>) -> Vec<(BindingKey, u32)> {
    let mut rows: Vec<_> = store
        .keys()
        .map(|k| (k.clone(), store.get(k).unwrap()))
        .collect();
    rows.sort();
    rows
}

fn loaded(keys: &[BindingKey]) -> RemapEngine<u32> {
    loaded_with(keys, Config::default())
}

fn loaded_with(keys: &[BindingKey], cfg: Config) -> RemapEngine<u32> {
    let mut engine = RemapEngine::new(cfg);
    engine.load(CapturedSet::new(keys.to_vec())).unwrap();
    engine
}

fn rig() -> Vec<BindingKey> {
    vec![
        key("Root", "m_LocalPosition.x"),
        key("Root/Arm", "m_LocalPosition.x"),
        key("Root/Arm/Hand", "m_LocalPosition.x"),
        key("Root/Arm/Hand", "m_LocalPosition.y"),
        key("Camera", "m_LocalPosition.x"),
    ]
}

#[test]
fn preview_preserves_captured_order_for_matches() {
    let keys = rig();
    let mut engine = loaded(&keys);
    for search in ["", "Arm", "Hand", "Root", "Camera", "Nope"] {
        let expected: Vec<(usize, &BindingKey)> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.path.contains(search))
            .collect();
        let preview = engine.preview("X", search, RewriteMode::Suffix);
        assert_eq!(preview.len(), expected.len(), "search '{search}'");
        for (entry, (j, original)) in preview.entries.iter().zip(expected) {
            assert_eq!(entry.index, j);
            assert_eq!(&entry.source, original);
        }
    }
}

#[test]
fn mode_examples_on_arm_hand() {
    let mut engine = loaded(&[key("Arm/Hand", "m_LocalPosition.x")]);
    let cases = [
        (RewriteMode::Prefix, "Left/Arm/Hand"),
        (RewriteMode::Infix, "Arm/Left"),
        (RewriteMode::Suffix, "Arm/Hand/Left"),
    ];
    for (mode, expected) in cases {
        let preview = engine.preview("Left", "Hand", mode);
        assert_eq!(preview.entries[0].target.path, expected, "{mode}");
        assert_eq!(preview.entries[0].target.property, "m_LocalPosition.x");
    }
}

#[test]
fn empty_text_is_identity_for_prefix_and_suffix() {
    let mut engine = loaded(&rig());
    for mode in [RewriteMode::Prefix, RewriteMode::Suffix] {
        for e in &engine.preview("", "Root", mode).entries {
            assert_eq!(e.target, e.source);
        }
    }
}

#[test]
fn preview_replaces_rather_than_accumulates() {
    let mut engine = loaded(&rig());
    assert_eq!(engine.preview("A", "Root", RewriteMode::Prefix).len(), 4);
    assert_eq!(engine.preview("A", "Camera", RewriteMode::Prefix).len(), 1);
    let current = engine.current_preview().unwrap();
    assert_eq!(current.request.search, "Camera");
    assert_eq!(current.summary(), "1 of 5 bindings match");
}

#[test]
fn filtered_out_entries_never_appear() {
    let mut engine = loaded(&rig());
    for mode in RewriteMode::ALL {
        let preview = engine.preview("Z", "Hand", mode);
        assert!(preview.entries.iter().all(|e| e.source.path.contains("Hand")));
        assert_eq!(preview.len(), 2);
    }
}

#[test]
fn apply_then_discard_restores_exact_state() {
    let keys = rig();
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("Rig", "Arm", RewriteMode::Prefix);
    let report = engine.apply(&mut store).unwrap();
    assert_eq!(report.applied, 3);
    assert!(!report.chained);
    assert_ne!(contents(&store), before);
    assert_eq!(store.get(&key("Rig/Root/Arm/Hand", "m_LocalPosition.y")), Some(4));

    assert_eq!(engine.discard(&mut store).unwrap(), DiscardReport::Reverted(3));
    assert_eq!(contents(&store), before);
    assert!(!engine.is_dirty());
}

#[test]
fn repeated_apply_with_same_inputs_is_a_noop() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);

    engine.preview("Rig", "Root", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();
    let after_first = contents(&store);

    let report = engine.apply(&mut store).unwrap();
    assert!(report.chained);
    assert_eq!(contents(&store), after_first);
}

#[test]
fn reapply_with_new_text_moves_data_from_live_keys() {
    let keys = rig();
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("First", "Hand", RewriteMode::Suffix);
    engine.apply(&mut store).unwrap();
    assert!(store.contains(&key("Root/Arm/Hand/First", "m_LocalPosition.x")));

    engine.preview("Second", "Hand", RewriteMode::Suffix);
    let report = engine.apply(&mut store).unwrap();
    assert!(report.chained);
    assert!(!store.contains(&key("Root/Arm/Hand/First", "m_LocalPosition.x")));
    assert_eq!(store.get(&key("Root/Arm/Hand/Second", "m_LocalPosition.x")), Some(3));
    assert_eq!(store.get(&key("Root/Arm/Hand/Second", "m_LocalPosition.y")), Some(4));
    assert_eq!(store.len(), before.len());

    // one discard undoes both applies
    engine.discard(&mut store).unwrap();
    assert_eq!(contents(&store), before);
}

#[test]
fn reapply_with_narrower_filter_keeps_other_renames_discardable() {
    let keys = rig();
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("Rig", "Root", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();
    engine.preview("Alt", "Hand", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();

    // Hand entries moved from their live Rig/... keys, the others stayed under Rig/
    assert!(store.contains(&key("Alt/Root/Arm/Hand", "m_LocalPosition.x")));
    assert!(store.contains(&key("Rig/Root/Arm", "m_LocalPosition.x")));
    assert!(!store.contains(&key("Rig/Root/Arm/Hand", "m_LocalPosition.x")));
    assert_eq!(engine.checkpoint().unwrap().len(), 4);

    engine.discard(&mut store).unwrap();
    assert_eq!(contents(&store), before);
}

#[test]
fn applying_back_to_originals_returns_to_clean() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);

    engine.preview("Hand", "Hand", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();
    assert!(!engine.is_dirty());

    engine.preview("Paw", "Hand", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();
    assert!(engine.is_dirty());
    engine.preview("Hand", "Hand", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();
    assert!(!engine.is_dirty());
    assert!(store.contains(&key("Root/Arm/Hand", "m_LocalPosition.y")));
}

#[test]
fn discard_without_apply_is_a_noop() {
    let keys = rig();
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);
    engine.preview("X", "", RewriteMode::Prefix);
    assert_eq!(
        engine.discard(&mut store).unwrap(),
        DiscardReport::NothingToRevert
    );
    assert_eq!(contents(&store), before);
}

#[test]
fn three_root_keys_prefixed_with_new() {
    let keys = vec![
        key("Root", "m_LocalPosition.x"),
        key("Root/Spine", "m_LocalPosition.x"),
        key("Root/Spine/Head", "m_LocalRotation.w"),
    ];
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);

    let preview = engine.preview("New", "Root", RewriteMode::Prefix);
    assert!(preview
        .entries
        .iter()
        .all(|e| e.target.path.starts_with("New/Root")));
    assert_eq!(engine.apply(&mut store).unwrap().applied, 3);
    for k in &keys {
        assert!(!store.contains(k), "{k} should be gone");
    }
    assert_eq!(store.len(), 3);
}

#[test]
fn apply_validates_per_mode() {
    let keys = rig();
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("", "Arm", RewriteMode::Prefix);
    assert!(matches!(
        engine.apply(&mut store),
        Err(RemapError::InvalidInput {
            mode: RewriteMode::Prefix,
            ..
        })
    ));

    engine.preview("Left", "", RewriteMode::Infix);
    assert!(matches!(
        engine.apply(&mut store),
        Err(RemapError::InvalidInput {
            mode: RewriteMode::Infix,
            ..
        })
    ));
    assert_eq!(contents(&store), before);

    // empty replacement text is a valid infix rename
    engine.preview("", "Arm/", RewriteMode::Infix);
    assert_eq!(engine.apply(&mut store).unwrap().applied, 2);
}

#[test]
fn apply_without_matches_reports_empty_match_set() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);
    assert!(matches!(
        engine.apply(&mut store),
        Err(RemapError::EmptyMatchSet { .. })
    ));
    engine.preview("X", "Tail", RewriteMode::Prefix);
    match engine.apply(&mut store) {
        Err(RemapError::EmptyMatchSet { search }) => assert_eq!(search, "Tail"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_source_aborts_without_mutation() {
    let keys = rig();
    let mut store = store_for(&keys);
    store.delete(&keys[2]).unwrap();
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("Rig", "Arm", RewriteMode::Prefix);
    match engine.apply(&mut store) {
        Err(RemapError::MissingSourceValue { missing }) => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].index, 2);
            assert_eq!(missing[0].key, keys[2]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(contents(&store), before);
    assert!(!engine.is_dirty());
}

#[test]
fn drift_between_checkpoint_and_store_is_reported_on_discard() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);
    engine.preview("Rig", "Camera", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();

    store.delete(&key("Rig/Camera", "m_LocalPosition.x")).unwrap();
    assert!(matches!(
        engine.discard(&mut store),
        Err(RemapError::MissingSourceValue { .. })
    ));
    // checkpoint is kept for a retry
    assert!(engine.is_dirty());
}

#[test]
fn occupied_target_is_rejected_by_default() {
    let keys = vec![
        key("Right/Hand", "m_LocalPosition.x"),
        key("Hand", "m_LocalPosition.x"),
    ];
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("", "Right/", RewriteMode::Infix);
    match engine.apply(&mut store) {
        Err(RemapError::TargetCollision { key: k }) => assert_eq!(k.path, "Hand"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(contents(&store), before);
    assert!(!engine.is_dirty());
}

#[test]
fn two_sources_collapsing_onto_one_target_are_rejected() {
    let keys = vec![
        key("A/Hand", "m_LocalPosition.x"),
        key("A/A/Hand", "m_LocalPosition.x"),
    ];
    let mut store = store_for(&keys);
    let mut engine = loaded_with(&keys, overwrite());

    engine.preview("", "A/", RewriteMode::Infix);
    assert!(matches!(
        engine.apply(&mut store),
        Err(RemapError::TargetCollision { .. })
    ));
    assert_eq!(store.len(), 2);
}

fn overwrite() -> Config {
    Config {
        collisions: CollisionPolicy::Overwrite,
        ..Config::default()
    }
}

#[test]
fn overwrite_policy_still_rejects_captured_targets() {
    let keys = vec![
        key("Right/Hand", "m_LocalPosition.x"),
        key("Hand", "m_LocalPosition.x"),
    ];
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded_with(&keys, overwrite());

    engine.preview("", "Right/", RewriteMode::Infix);
    assert_eq!(
        engine.apply(&mut store).unwrap_err(),
        RemapError::TargetCollision {
            key: key("Hand", "m_LocalPosition.x")
        }
    );
    assert_eq!(contents(&store), before);
}

#[test]
fn overwritten_data_comes_back_on_discard() {
    let keys = vec![key("Right/Hand", "m_LocalPosition.x")];
    let mut store = store_for(&keys);
    // present in the store but not captured
    store.insert(key("Hand", "m_LocalPosition.x"), 7);
    let before = contents(&store);
    let mut engine = loaded_with(&keys, overwrite());

    engine.preview("", "Right/", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&key("Hand", "m_LocalPosition.x")), Some(1));
    let cp = engine.checkpoint().unwrap();
    assert_eq!(cp.displaced(), &[(key("Hand", "m_LocalPosition.x"), 7)]);

    assert_eq!(engine.discard(&mut store).unwrap(), DiscardReport::Reverted(1));
    assert_eq!(contents(&store), before);
}

#[test]
fn chained_apply_cannot_overwrite_another_renamed_binding() {
    let keys = vec![
        key("A/Hand", "m_LocalPosition.x"),
        key("B", "m_LocalPosition.x"),
    ];
    let mut store = store_for(&keys);
    let before = contents(&store);
    let mut engine = loaded_with(&keys, overwrite());

    engine.preview("X", "B", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();
    assert_eq!(store.get(&key("X/B", "m_LocalPosition.x")), Some(2));

    // X/B now holds B's data, so A/Hand may not land there
    engine.preview("X/B", "A/Hand", RewriteMode::Infix);
    assert_eq!(
        engine.apply(&mut store).unwrap_err(),
        RemapError::TargetCollision {
            key: key("X/B", "m_LocalPosition.x")
        }
    );
    assert_eq!(store.get(&key("A/Hand", "m_LocalPosition.x")), Some(1));

    assert_eq!(engine.discard(&mut store).unwrap(), DiscardReport::Reverted(1));
    assert_eq!(contents(&store), before);
}

#[test]
fn moving_back_after_an_overwrite_stays_dirty_until_discard() {
    let keys = vec![key("Right/Hand", "m_LocalPosition.x")];
    let mut store = store_for(&keys);
    store.insert(key("Hand", "m_LocalPosition.x"), 7);
    let before = contents(&store);
    let mut engine = loaded_with(&keys, overwrite());

    engine.preview("", "Right/", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();
    engine.preview("Right/", "Right/", RewriteMode::Infix);
    engine.apply(&mut store).unwrap();

    // the binding is home again but the overwritten value is still owed
    assert_eq!(store.get(&key("Right/Hand", "m_LocalPosition.x")), Some(1));
    assert!(!store.contains(&key("Hand", "m_LocalPosition.x")));
    assert!(engine.is_dirty());
    assert!(engine.checkpoint().unwrap().entries().is_empty());

    assert_eq!(engine.discard(&mut store).unwrap(), DiscardReport::Reverted(0));
    assert_eq!(contents(&store), before);
    assert!(!engine.is_dirty());
}

#[test]
fn rejected_write_rolls_back_and_keeps_clean_state() {
    let keys = rig();
    let mut store = store_for(&keys);
    store.lock(key("Rig/Root/Arm/Hand", "m_LocalPosition.y"));
    let before = contents(&store);
    let mut engine = loaded(&keys);

    engine.preview("Rig", "Root", RewriteMode::Prefix);
    match engine.apply(&mut store) {
        Err(err @ RemapError::Store { .. }) => assert!(err.is_recoverable()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(contents(&store), before);
    assert!(!engine.is_dirty());
}

#[test]
fn dirty_reload_abandons_checkpoint_silently_by_default() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded(&keys);
    engine.preview("Rig", "Hand", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();

    let report = engine.load(store.bindings()).unwrap();
    assert_eq!(report.abandoned.map(|cp| cp.len()), Some(2));
    assert!(!engine.is_dirty());
    assert!(engine.current_preview().is_none());
    // the renamed keys are now the captured originals; discard has nothing to do
    assert_eq!(
        engine.discard(&mut store).unwrap(),
        DiscardReport::NothingToRevert
    );
    assert!(store.contains(&key("Rig/Root/Arm/Hand", "m_LocalPosition.x")));
}

#[test]
fn dirty_reload_can_be_rejected() {
    let keys = rig();
    let mut store = store_for(&keys);
    let mut engine = loaded_with(
        &keys,
        Config {
            reload: ReloadPolicy::Reject,
            ..Config::default()
        },
    );
    engine.preview("Rig", "Hand", RewriteMode::Prefix);
    engine.apply(&mut store).unwrap();

    assert_eq!(
        engine.load(store.bindings()).unwrap_err(),
        RemapError::DirtyReload { pending: 2 }
    );
    assert!(engine.is_dirty());
    engine.discard(&mut store).unwrap();
    assert!(engine.load(store.bindings()).is_ok());
}
