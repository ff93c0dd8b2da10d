//! Unit tests for group key resolution and the sibling relation.

use rstest::rstest;
use splitscroll::types::tab::{GroupKey, TabInfo};

#[rstest]
#[case::split_view_wins(TabInfo::new(1, 1).with_split_view(7).with_group(3).with_index(2), GroupKey::SplitView(7))]
#[case::group_before_index(TabInfo::new(1, 1).with_group(3).with_index(2), GroupKey::TabGroup(3))]
#[case::index_last_resort(TabInfo::new(1, 1).with_index(2), GroupKey::Position(2))]
#[case::nothing_at_all(TabInfo::new(1, 1), GroupKey::Ungrouped)]
#[case::negative_split_view_is_absent(TabInfo::new(1, 1).with_split_view(-1).with_group(4), GroupKey::TabGroup(4))]
#[case::negative_group_is_absent(TabInfo::new(1, 1).with_group(-1), GroupKey::Ungrouped)]
fn resolves_by_priority(#[case] tab: TabInfo, #[case] expected: GroupKey) {
    assert_eq!(GroupKey::resolve(&tab), expected);
    assert_eq!(tab.group_key(), expected);
}

#[rstest]
#[case(GroupKey::SplitView(5), "5")]
#[case(GroupKey::TabGroup(5), "group_5")]
#[case(GroupKey::Position(0), "index_0")]
#[case(GroupKey::Ungrouped, "ungrouped")]
fn display_prefixes_keep_kinds_apart(#[case] key: GroupKey, #[case] text: &str) {
    assert_eq!(key.to_string(), text);
}

#[test]
fn split_view_and_group_with_same_number_are_not_siblings() {
    assert!(!GroupKey::SplitView(5).is_same_group(&GroupKey::TabGroup(5)));
}

#[test]
fn ungrouped_tabs_are_siblings_of_each_other() {
    assert!(GroupKey::Ungrouped.is_same_group(&GroupKey::Ungrouped));
}

#[test]
fn defined_and_ungrouped_are_never_siblings() {
    for key in [GroupKey::SplitView(1), GroupKey::TabGroup(1), GroupKey::Position(1)] {
        assert!(!key.is_same_group(&GroupKey::Ungrouped));
        assert!(!GroupKey::Ungrouped.is_same_group(&key));
    }
}

#[test]
fn tab_info_uses_camel_case_on_the_wire() {
    let tab = TabInfo::new(3, 9).with_split_view(2);
    let value = serde_json::to_value(&tab).unwrap();
    assert_eq!(value, serde_json::json!({"id": 3, "windowId": 9, "splitViewId": 2}));

    let back: TabInfo = serde_json::from_value(serde_json::json!({"id": 3, "windowId": 9, "groupId": -1})).unwrap();
    assert_eq!(back.group_id, Some(-1));
    assert_eq!(back.group_key(), GroupKey::Ungrouped);
}
