//! Design pattern inference and transform pre-flight advice.

use axi::base::ModelId;
use axi::schema::{SchemaSet, SchemaState};
use axi::{Pattern, TransformHint};
use rstest::rstest;

use crate::helpers::schema_fixtures::{
    empty_schema, leaf_globals_schema, order_item_schema, root_child_schema, session_over,
    shared_type_schema, typed_globals_schema, typed_reference_schema, venetian_schema,
};

// ============================================================================
// INFERENCE
// ============================================================================

#[rstest]
#[case::empty(empty_schema(), None)]
#[case::single_root(root_child_schema(), Some(Pattern::RussianDoll))]
#[case::single_leaf(leaf_globals_schema(), Some(Pattern::RussianDoll))]
#[case::many_roots(order_item_schema(), Some(Pattern::SalamiSlice))]
#[case::typed_roots(typed_globals_schema(), Some(Pattern::GardenOfEden))]
#[case::one_typed_root(shared_type_schema(), Some(Pattern::GardenOfEden))]
#[case::inline_root_with_types(venetian_schema(), Some(Pattern::VenetianBlind))]
fn test_infer_design_pattern(#[case] schema: (SchemaSet, ModelId), #[case] expected: Option<Pattern>) {
    let mut session = session_over(schema);
    assert_eq!(session.infer_design_pattern(), expected);
}

// ============================================================================
// PRE-FLIGHT ADVICE
// ============================================================================

#[rstest]
#[case::same(root_child_schema(), Pattern::RussianDoll, TransformHint::SameDesignPattern)]
#[case::doll_to_slices(root_child_schema(), Pattern::SalamiSlice, TransformHint::Ok)]
#[case::nothing_global(empty_schema(), Pattern::GardenOfEden, TransformHint::NoGlobalElements)]
#[case::only_leaves(leaf_globals_schema(), Pattern::GardenOfEden, TransformHint::NoChildElements)]
#[case::slices_drop_types(typed_globals_schema(), Pattern::SalamiSlice, TransformHint::WillRemoveTypes)]
#[case::doll_drops_types(typed_globals_schema(), Pattern::RussianDoll, TransformHint::WillRemoveTypes)]
#[case::doll_drops_referenced(order_item_schema(), Pattern::RussianDoll, TransformHint::WillRemoveGlobalElements)]
#[case::blind_drops_referenced(order_item_schema(), Pattern::VenetianBlind, TransformHint::WillRemoveGlobalElements)]
#[case::eden_keeps_all(order_item_schema(), Pattern::GardenOfEden, TransformHint::Ok)]
#[case::doll_drops_both(
    typed_reference_schema(),
    Pattern::RussianDoll,
    TransformHint::WillRemoveGlobalElementsAndTypes
)]
fn test_can_transform_schema(
    #[case] schema: (SchemaSet, ModelId),
    #[case] target: Pattern,
    #[case] expected: TransformHint,
) {
    let mut session = session_over(schema);
    assert_eq!(session.can_transform_schema(target), expected);
}

#[test]
fn test_broken_document_cannot_transform() {
    let mut session = session_over(root_child_schema());
    {
        let schemas = session.schemas();
        let mut set = schemas.lock();
        set.model_mut(session.schema_id())
            .unwrap()
            .set_state(SchemaState::NotWellFormed);
    }
    assert_eq!(
        session.can_transform_schema(Pattern::GardenOfEden),
        TransformHint::InvalidSchema
    );
    assert!(session.transform(Pattern::GardenOfEden).is_err());
}

#[test]
fn test_configured_pattern_wins_over_inference() {
    let (set, id) = root_child_schema();
    let config = axi::SessionConfig::default().with_pattern(Some(Pattern::SalamiSlice));
    let mut session = axi::DocumentSession::open(set, id, config).unwrap();
    assert_eq!(
        session.can_transform_schema(Pattern::SalamiSlice),
        TransformHint::SameDesignPattern
    );
    assert_eq!(session.can_transform_schema(Pattern::RussianDoll), TransformHint::Ok);
}
