//! Parser Benchmark Suite for netcontext
//!
//! Measures the cost of turning IOS configuration text into a tree:
//!
//! 1. **Whole-file parsing** - interface-heavy and ACL-heavy configurations
//! 2. **Standard ACL canonicalisation** - block buffering and flushing
//! 3. **Rule normalisation** - extended IPv4 and IPv6 rule rewriting
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench --bench parse_benchmark
//! cargo bench --bench parse_benchmark -- parse_
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use netcontext::ios::{normalize_ext_rule, normalize_v6_rule, IosParser};
use std::fmt::Write;

// ============================================================================
// Input Generators
// ============================================================================

fn generate_switch_config(interfaces: usize) -> String {
    let mut text = String::from("hostname bench-sw\n!\n");

    for vlan in 1..=32 {
        let _ = writeln!(text, "vlan {vlan}\n name users-{vlan}\n!");
    }

    for i in 0..interfaces {
        let _ = writeln!(
            text,
            "interface GigabitEthernet1/0/{i}\n \
             description access port {i}\n \
             switchport trunk native vlan {}\n \
             switchport trunk allowed vlan 1,3-10,20\n \
             ip address 10.{}.{}.1 255.255.255.0\n \
             ip access-group BENCH-IN in\n \
             no cdp enable\n!",
            i % 32 + 1,
            i / 256,
            i % 256
        );
    }

    text
}

fn generate_acl_config(rules: usize) -> String {
    let mut text = String::new();

    for i in 0..rules {
        // Alternating overlapping and disjoint entries exercise both the
        // sorted buffering and the block flush.
        let _ = writeln!(
            text,
            "access-list 10 permit 10.{}.{}.0 0.0.0.255",
            (i / 256) % 256,
            i % 256
        );
        if i % 8 == 0 {
            let _ = writeln!(text, "access-list 10 deny 10.{}.{}.7", (i / 256) % 256, i % 256);
        }
    }

    text.push_str("ip access-list extended BENCH-IN\n");
    for i in 0..rules {
        let _ = writeln!(
            text,
            " permit tcp 192.0.2.0 0.0.0.255 host 198.51.100.{} eq www log",
            i % 256
        );
    }

    text
}

// ============================================================================
// Whole-file Parsing Benchmarks
// ============================================================================

fn bench_parse_interfaces(c: &mut Criterion) {
    let parser = IosParser::new().unwrap();
    let mut group = c.benchmark_group("parse_interfaces");

    for size in [10, 100, 1000].iter() {
        let text = generate_switch_config(*size);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(parser.parse(black_box(text))))
        });
    }

    group.finish();
}

fn bench_parse_acls(c: &mut Criterion) {
    let parser = IosParser::new().unwrap();
    let mut group = c.benchmark_group("parse_acls");

    for size in [10, 100, 1000].iter() {
        let text = generate_acl_config(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(parser.parse(black_box(text))))
        });
    }

    group.finish();
}

fn bench_parser_construction(c: &mut Criterion) {
    c.bench_function("parser_construction", |b| {
        b.iter(|| black_box(IosParser::new()))
    });
}

// ============================================================================
// Rule Normalisation Benchmarks
// ============================================================================

fn bench_rule_normalisation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_normalisation");

    group.bench_function("extended", |b| {
        b.iter(|| {
            black_box(normalize_ext_rule(black_box(
                "permit tcp 10.0.0.0 0.0.0.255 range 1024 65535 host 192.0.2.1 eq www established",
            )))
        })
    });

    group.bench_function("ipv6", |b| {
        b.iter(|| {
            black_box(normalize_v6_rule(black_box(
                "permit tcp 2001:DB8::/32 any eq 443 log",
            )))
        })
    });

    group.finish();
}

criterion_group!(
    parse_benches,
    bench_parse_interfaces,
    bench_parse_acls,
    bench_parser_construction,
);

criterion_group!(rule_benches, bench_rule_normalisation);

criterion_main!(parse_benches, rule_benches);
