//! Integration tests for HierarchyStore

use rstest::{fixture, rstest};

use taxotree::domain::{
    AttrValue, Attributes, DomainError, GroupKey, GroupPayload, HierarchyStore, SearchQuery,
    SpeciesMeasures,
};
use taxotree::util::testing;

fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn earth() -> GroupKey {
    GroupKey::new("Life", "Earth")
}

fn eukarya() -> GroupKey {
    GroupKey::new("Domain", "Eukarya")
}

/// Earth -> Eukarya -> Lion, the canonical example hierarchy.
#[fixture]
fn lion_store() -> HierarchyStore {
    testing::init_test_setup();
    let mut store = HierarchyStore::new();
    store
        .create(
            "Life",
            "Earth",
            None,
            None,
            attrs(&[("Habitat", "Terrestrial".into())]),
        )
        .unwrap();
    store
        .create(
            "Domain",
            "Eukarya",
            Some(earth()),
            Some("cells with nuclei".into()),
            attrs(&[("Cells", "Eukaryotic".into())]),
        )
        .unwrap();
    store
        .create_species(
            "Lion",
            eukarya(),
            SpeciesMeasures::new(10.0, 190.0, 1.8),
            None,
            attrs(&[("Diet", "Carnivore".into())]),
        )
        .unwrap();
    store
}

#[rstest]
fn given_valid_creations_when_reading_back_then_each_appears_once_under_parent(
    lion_store: HierarchyStore,
) {
    let lion = lion_store.get("Species", "Lion").unwrap();
    assert!(lion.is_species());
    assert_eq!(lion.parent, Some(eukarya()));

    let siblings = lion_store.children(&eukarya());
    assert_eq!(
        siblings
            .iter()
            .filter(|k| **k == GroupKey::new("Species", "Lion"))
            .count(),
        1
    );
    assert_eq!(lion_store.len(), 3);
}

#[rstest]
fn given_existing_key_when_creating_duplicate_then_fails_and_store_unchanged(
    mut lion_store: HierarchyStore,
) {
    let err = lion_store
        .create("Domain", "Eukarya", Some(earth()), None, Attributes::new())
        .unwrap_err();

    assert_eq!(err, DomainError::DuplicateEntity(eukarya()));
    assert_eq!(lion_store.len(), 3);
    assert_eq!(lion_store.children(&earth()), &[eukarya()]);
    assert_eq!(lion_store.render_tree().len(), 3);
}

#[rstest]
#[case::absent_parent(Some(GroupKey::new("Domain", "Archaea")))]
#[case::no_parent(None)]
#[case::species_parent(Some(GroupKey::new("Species", "Lion")))]
fn given_unusable_parent_when_creating_then_missing_parent_and_store_unchanged(
    mut lion_store: HierarchyStore,
    #[case] parent: Option<GroupKey>,
) {
    let err = lion_store
        .create("Kingdom", "Animalia", parent, None, Attributes::new())
        .unwrap_err();

    assert!(matches!(err, DomainError::MissingParent { .. }), "{err:?}");
    assert!(!lion_store.contains(&GroupKey::new("Kingdom", "Animalia")));
    assert_eq!(lion_store.len(), 3);
}

#[rstest]
fn given_species_kind_when_using_generic_create_then_invalid_argument(
    mut lion_store: HierarchyStore,
) {
    let err = lion_store
        .create("Species", "Tiger", Some(eukarya()), None, Attributes::new())
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[rstest]
fn given_life_with_parent_when_creating_then_invalid_argument(mut lion_store: HierarchyStore) {
    let err = lion_store
        .create("Life", "Mars", Some(earth()), None, Attributes::new())
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[rstest]
fn given_ancestors_with_attributes_when_creating_then_effective_is_root_to_leaf_merge(
    mut lion_store: HierarchyStore,
) {
    lion_store
        .create(
            "Kingdom",
            "Animalia",
            Some(eukarya()),
            None,
            attrs(&[("Cells", "Many".into()), ("Legs", 4.into())]),
        )
        .unwrap();

    let animalia = lion_store.get("Kingdom", "Animalia").unwrap();
    assert_eq!(
        animalia.effective_attributes.get("Habitat"),
        Some(&AttrValue::from("Terrestrial"))
    );
    // The closer group wins on collision
    assert_eq!(
        animalia.effective_attributes.get("Cells"),
        Some(&AttrValue::from("Many"))
    );
    assert_eq!(animalia.own_attributes.len(), 2);
}

#[rstest]
fn given_species_when_created_then_measures_override_same_named_extras(
    mut lion_store: HierarchyStore,
) {
    let tiger = lion_store
        .create_species(
            "Tiger",
            eukarya(),
            SpeciesMeasures::new(12.0, 220.0, 2.0),
            None,
            attrs(&[("Age", 99.into())]),
        )
        .unwrap();
    assert_eq!(tiger.own_attributes.get("Age"), Some(&AttrValue::Number(12.0)));
    assert_eq!(tiger.own_attributes.get("Size"), Some(&AttrValue::Number(2.0)));
}

#[rstest]
fn given_lion_under_eukarya_when_deleting_eukarya_then_lion_is_gone(
    mut lion_store: HierarchyStore,
) {
    lion_store.delete("Domain", "Eukarya").unwrap();

    assert!(lion_store.get("Domain", "Eukarya").is_none());
    assert!(lion_store.get("Species", "Lion").is_none());
    assert!(lion_store.children(&earth()).is_empty());
    assert_eq!(lion_store.render_tree().len(), 1);

    let hits = lion_store.search(&SearchQuery::new().matching("Lion", Default::default()));
    assert!(hits.is_empty());
}

#[rstest]
fn given_species_when_deleting_then_only_it_is_removed(mut lion_store: HierarchyStore) {
    lion_store.delete("Species", "Lion").unwrap();

    assert_eq!(lion_store.len(), 2);
    assert!(lion_store.children(&eukarya()).is_empty());
}

#[rstest]
fn given_absent_group_when_deleting_then_not_found(mut lion_store: HierarchyStore) {
    let err = lion_store.delete("Domain", "Archaea").unwrap_err();
    assert_eq!(err, DomainError::NotFound(GroupKey::new("Domain", "Archaea")));
    assert_eq!(lion_store.len(), 3);
}

#[rstest]
fn given_branch_when_editing_attribute_then_subtree_own_and_effective_are_updated(
    mut lion_store: HierarchyStore,
) {
    lion_store
        .edit_attribute(&eukarya(), "Diet", AttrValue::from("Herbivore"))
        .unwrap();

    let lion = lion_store.get("Species", "Lion").unwrap();
    assert_eq!(lion.own_attributes.get("Diet"), Some(&AttrValue::from("Herbivore")));
    assert!(lion_store
        .info(&GroupKey::new("Species", "Lion"))
        .unwrap()
        .contains("Diet: Herbivore"));

    // Earth lies outside the edited subtree
    let earth_group = lion_store.get("Life", "Earth").unwrap();
    assert!(earth_group.own_attributes.get("Diet").is_none());
}

#[rstest]
fn given_root_edit_when_descendants_inherit_then_effective_view_is_refreshed(
    mut lion_store: HierarchyStore,
) {
    lion_store
        .edit_attribute(&earth(), "Habitat", AttrValue::from("Aquatic"))
        .unwrap();

    for key in [earth(), eukarya(), GroupKey::new("Species", "Lion")] {
        let group = lion_store.get_by_key(&key).unwrap();
        assert_eq!(
            group.effective_attributes.get("Habitat"),
            Some(&AttrValue::from("Aquatic")),
            "{key}"
        );
    }
}

#[rstest]
fn given_ancestor_edit_of_measure_when_reading_species_then_payload_follows_attributes(
    mut lion_store: HierarchyStore,
) {
    lion_store
        .edit_attribute(&earth(), "Age", AttrValue::from(20))
        .unwrap();

    let lion = lion_store.get("Species", "Lion").unwrap();
    assert_eq!(lion.own_attributes.get("Age"), Some(&AttrValue::Number(20.0)));
    assert_eq!(
        lion.payload,
        GroupPayload::Species(SpeciesMeasures::new(20.0, 190.0, 1.8))
    );
}

#[rstest]
fn given_text_value_for_measure_when_editing_species_subtree_then_rejected_and_unchanged(
    mut lion_store: HierarchyStore,
) {
    let err = lion_store
        .edit_attribute(&eukarya(), "Size", AttrValue::from("large"))
        .unwrap_err();

    assert!(matches!(err, DomainError::InvalidArgument(_)));
    let lion = lion_store.get("Species", "Lion").unwrap();
    assert_eq!(lion.own_attributes.get("Size"), Some(&AttrValue::Number(1.8)));
    assert!(lion_store
        .get_by_key(&eukarya())
        .unwrap()
        .own_attributes
        .get("Size")
        .is_none());
}

#[rstest]
fn given_species_when_editing_attribute_then_siblings_and_parent_are_unchanged(
    mut lion_store: HierarchyStore,
) {
    lion_store
        .create_species(
            "Tiger",
            eukarya(),
            SpeciesMeasures::new(12.0, 220.0, 2.0),
            None,
            attrs(&[("Diet", "Carnivore".into())]),
        )
        .unwrap();

    lion_store
        .edit_attribute(&GroupKey::new("Species", "Lion"), "Diet", AttrValue::from("Herbivore"))
        .unwrap();

    let lion = lion_store.get("Species", "Lion").unwrap();
    assert_eq!(lion.effective_attributes.get("Diet"), Some(&AttrValue::from("Herbivore")));
    let tiger = lion_store.get("Species", "Tiger").unwrap();
    assert_eq!(tiger.own_attributes.get("Diet"), Some(&AttrValue::from("Carnivore")));
    let parent = lion_store.get_by_key(&eukarya()).unwrap();
    assert!(parent.own_attributes.get("Diet").is_none());
    assert!(parent.effective_attributes.get("Diet").is_none());
}

#[rstest]
fn given_life_root_when_deleting_then_whole_hierarchy_is_gone(mut lion_store: HierarchyStore) {
    lion_store.delete("Life", "Earth").unwrap();

    assert!(lion_store.is_empty());
    assert!(lion_store.get("Species", "Lion").is_none());
    assert!(lion_store.render_tree().is_empty());
    assert_eq!(lion_store.render_tree().len(), 0);
    assert!(lion_store.search(&SearchQuery::new()).is_empty());
}

#[rstest]
fn given_absent_group_when_editing_then_not_found(mut lion_store: HierarchyStore) {
    let err = lion_store
        .edit_attribute(&GroupKey::new("Genus", "Panthera"), "Legs", 4.into())
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[rstest]
fn given_description_when_setting_then_info_shows_it(mut lion_store: HierarchyStore) {
    let lion = GroupKey::new("Species", "Lion");
    lion_store
        .set_description(&lion, Some("king of the savanna".into()))
        .unwrap();
    let info = lion_store.info(&lion).unwrap();
    assert!(info.contains("Brief Info: king of the savanna,"));
    assert!(info.contains("Super Group: Domain,"));
    assert!(info.ends_with('.'));
}

#[rstest]
fn given_nested_groups_when_reading_ancestors_then_root_comes_first(lion_store: HierarchyStore) {
    let chain: Vec<&str> = lion_store
        .ancestors(&GroupKey::new("Species", "Lion"))
        .iter()
        .map(|g| g.name())
        .collect();
    assert_eq!(chain, vec!["Earth", "Eukarya", "Lion"]);
}

#[rstest]
fn given_branch_when_reading_subtree_then_returns_restricted_adjacency(
    lion_store: HierarchyStore,
) {
    let subtree = lion_store.subtree(&eukarya()).unwrap();
    let lion = GroupKey::new("Species", "Lion");
    assert_eq!(subtree.len(), 2);
    assert_eq!(subtree.get(&eukarya()), Some(&vec![lion.clone()]));
    assert_eq!(subtree.get(&lion), Some(&vec![]));
    assert!(!subtree.contains_key(&earth()));
}

#[rstest]
fn given_store_when_rendering_then_labels_hang_under_synthetic_root(lion_store: HierarchyStore) {
    let rendered = lion_store.render_tree().to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "Tree Of Life");
    assert!(rendered.contains("Earth (Life)"));
    assert!(rendered.contains("Eukarya (Domain)"));
    assert!(rendered.contains("Lion (Species)"));

    let sub = lion_store.subtree_view(&eukarya()).unwrap().to_string();
    assert!(sub.starts_with("Eukarya (Domain)"));
    assert!(!sub.contains("Earth"));
}

#[rstest]
fn given_custom_root_label_when_rendering_then_uses_it() {
    let mut store = HierarchyStore::with_root_label("Biota");
    store
        .create("Life", "Earth", None, None, Attributes::new())
        .unwrap();
    assert!(store.render_tree().to_string().starts_with("Biota"));
}
