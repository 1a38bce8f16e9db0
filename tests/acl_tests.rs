//! Access-list canonicalisation tests.
//!
//! Property-based checks that standard ACLs collapse to one form however
//! IOS was free to order them, plus fixed cases for block closing and for
//! extended/IPv6 rule normalisation.

use netcontext::ios::normalize_ext_rule;
use netcontext::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn parse(text: &str) -> ConfigTree {
    IosParser::new().unwrap().parse(text).unwrap()
}

fn acl(tree: &ConfigTree, section: &str, id: &str) -> Vec<String> {
    tree.object(section, id)
        .and_then(Value::as_list)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Canonical list for numbered standard ACL 10 built from `rules`.
fn canonical_std(rules: &[String]) -> Vec<String> {
    let text: String = rules
        .iter()
        .map(|rule| format!("access-list 10 {rule}\n"))
        .collect();
    acl(&parse(&text), "acl4-std", "10")
}

// ============================================================================
// Strategies
// ============================================================================

/// Distinct /24 networks under 10.0.0.0/8, in ascending address order.
fn disjoint_rules() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_map((0u8..=255, 0u8..=255), any::<bool>(), 1..24).prop_map(|nets| {
        nets.into_iter()
            .map(|((b, c), permit)| {
                let action = if permit { "permit" } else { "deny" };
                format!("{action} 10.{b}.{c}.0 0.0.0.255")
            })
            .collect()
    })
}

fn with_shuffle(rules: Vec<String>) -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    (Just(rules.clone()), Just(rules).prop_shuffle())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_disjoint_rules_sort_by_address((sorted, shuffled) in disjoint_rules().prop_flat_map(with_shuffle)) {
        prop_assert_eq!(canonical_std(&shuffled), sorted);
    }

    #[test]
    fn prop_overlap_keeps_blocks_apart(
        (before, before_shuffled) in disjoint_rules().prop_flat_map(with_shuffle),
        (after, after_shuffled) in disjoint_rules().prop_flat_map(with_shuffle),
    ) {
        // `deny any` overlaps everything, so nothing may cross it.
        let mut input = before_shuffled;
        input.push("deny any".to_string());
        input.extend(after_shuffled);

        let mut expected = before;
        expected.push("deny any".to_string());
        expected.extend(after);

        prop_assert_eq!(canonical_std(&input), expected);
    }

    #[test]
    fn prop_swapping_disjoint_pair_is_invisible(a in 0u8..=255, b in 0u8..=255) {
        prop_assume!(a != b);
        let first = format!("permit 172.16.{a}.0 0.0.0.255");
        let second = format!("deny 172.16.{b}.0 0.0.0.255");

        prop_assert_eq!(
            canonical_std(&[first.clone(), second.clone()]),
            canonical_std(&[second, first])
        );
    }

    #[test]
    fn prop_named_and_numeric_services_agree(port in prop::sample::select(vec![
        ("www", 80u16), ("domain", 53), ("bootps", 67), ("ntp", 123), ("smtp", 25), ("isakmp", 500),
    ])) {
        let (name, number) = port;
        let by_name = normalize_ext_rule(&format!("permit tcp any eq {name} any")).unwrap();
        let by_number = normalize_ext_rule(&format!("permit tcp any eq {number} any")).unwrap();
        prop_assert_eq!(by_name, by_number);
    }
}

// ============================================================================
// Standard ACL Blocks
// ============================================================================

#[test]
fn test_overlapping_rules_close_the_block() {
    let tree = parse(
        "\
access-list 20 permit 10.0.0.0 0.0.0.255
access-list 20 deny 10.0.0.128 0.0.0.127
access-list 20 permit 192.168.0.0 0.0.0.255
",
    );

    assert_eq!(
        acl(&tree, "acl4-std", "20"),
        vec![
            "permit 10.0.0.0 0.0.0.255",
            "deny 10.0.0.128 0.0.0.127",
            "permit 192.168.0.0 0.0.0.255",
        ]
    );
}

#[test]
fn test_disjoint_rule_after_overlap_sorts_into_new_block() {
    let tree = parse(
        "\
access-list 20 permit 192.168.0.0 0.0.0.255
access-list 20 permit 10.0.0.0 0.0.0.255
access-list 20 deny 10.0.0.128 0.0.0.127
access-list 20 permit 172.16.0.0 0.0.255.255
",
    );

    assert_eq!(
        acl(&tree, "acl4-std", "20"),
        vec![
            "permit 10.0.0.0 0.0.0.255",
            "permit 192.168.0.0 0.0.0.255",
            "deny 10.0.0.128 0.0.0.127",
            "permit 172.16.0.0 0.0.255.255",
        ]
    );
}

#[test]
fn test_equivalent_address_spellings() {
    let tree = parse(
        "\
ip access-list standard A
 permit host 10.1.1.1
 deny 0.0.0.0 255.255.255.255
ip access-list standard B
 permit 10.1.1.1
 deny any
",
    );

    assert_eq!(acl(&tree, "acl4-std", "A"), acl(&tree, "acl4-std", "B"));
    assert_eq!(acl(&tree, "acl4-std", "A"), vec!["permit 10.1.1.1", "deny any"]);
}

#[test]
fn test_numbered_and_named_lists_are_independent() {
    let tree = parse(
        "\
access-list 1 permit 10.0.0.1
ip access-list standard 1-NAMED
 permit 10.0.0.1
access-list 1 permit 10.0.0.1
",
    );

    assert_eq!(
        acl(&tree, "acl4-std", "1"),
        vec!["permit 10.0.0.1", "permit 10.0.0.1"]
    );
    assert_eq!(acl(&tree, "acl4-std", "1-NAMED"), vec!["permit 10.0.0.1"]);
}

#[test]
fn test_standard_remarks_are_ignored() {
    let tree = parse("ip access-list standard R\n remark jump hosts\n permit 10.0.0.9\n");
    assert_eq!(acl(&tree, "acl4-std", "R"), vec!["permit 10.0.0.9"]);
}

#[test]
fn test_invalid_wildcard_is_an_error() {
    let err = IosParser::new()
        .unwrap()
        .parse("access-list 5 permit 10.0.0.0 0.255.0.255\n")
        .unwrap_err();
    assert!(matches!(err.root(), Error::InvalidAddress { .. }));
}

// ============================================================================
// Extended and IPv6 Lists
// ============================================================================

#[test]
fn test_extended_rules_keep_source_order() {
    let tree = parse(
        "\
access-list 150 permit tcp any host 192.0.2.10 eq www
access-list 150 permit tcp any host 10.0.0.1 eq 443
access-list 150 deny ip any any log
",
    );

    assert_eq!(
        acl(&tree, "acl4-ext", "150"),
        vec![
            "permit tcp any host 192.0.2.10 eq 80",
            "permit tcp any host 10.0.0.1 eq 443",
            "deny ip any any log",
        ]
    );
}

#[test]
fn test_extended_named_and_numbered_forms_agree() {
    let tree = parse(
        "\
access-list 101 permit udp 10.0.0.0 0.0.0.255 eq bootpc any eq bootps
ip access-list extended DHCP
 permit udp 10.0.0.0 0.0.0.255 eq 68 any eq 67
",
    );

    assert_eq!(acl(&tree, "acl4-ext", "101"), acl(&tree, "acl4-ext", "DHCP"));
}

#[test]
fn test_ipv6_rules() {
    let tree = parse(
        "\
ipv6 access-list V6-IN
 permit tcp 2001:DB8:1::/48 any eq www
 permit icmp any any echo-reply
 deny any any log
",
    );

    assert_eq!(
        acl(&tree, "acl6", "V6-IN"),
        vec![
            "permit tcp 2001:db8:1::/48 any eq 80",
            "permit icmp any any echo-reply",
            "deny ipv6 any any",
        ]
    );
}
