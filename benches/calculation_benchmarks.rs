//! Performance benchmarks for the take-home pay engine.
//!
//! This benchmark suite measures:
//! - A single reference calculation
//! - Each calculator in isolation
//! - Batches of varied inputs
//! - Parsing and validating the embedded rule sets
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use take_home_engine::calculation::{
    calculate_income_tax, calculate_medicare_levy, calculate_surcharge, calculate_tax,
    calculate_tax_with_rules, repayment_for_income,
};
use take_home_engine::config::{ConfigLoader, RuleBook};
use take_home_engine::models::{CalculationInput, FamilyStatus, PayFrequency, Residency, RuleYear};

/// Builds a varied input for batch runs.
fn create_input(i: usize) -> CalculationInput {
    let frequency = match i % 3 {
        0 => PayFrequency::Weekly,
        1 => PayFrequency::Monthly,
        _ => PayFrequency::Annual,
    };
    let salary = match frequency {
        PayFrequency::Weekly => Decimal::from(800 + (i % 40) * 50),
        PayFrequency::Monthly => Decimal::from(3_500 + (i % 40) * 250),
        PayFrequency::Annual => Decimal::from(40_000 + (i % 40) * 5_000),
    };

    CalculationInput {
        salary,
        pay_frequency: frequency,
        package_includes_retirement_contribution: i % 4 == 0,
        rule_year: if i % 2 == 0 {
            RuleYear::Fy2025_26
        } else {
            RuleYear::Fy2024_25
        },
        residency: if i % 7 == 0 {
            Residency::NonResident
        } else {
            Residency::Resident
        },
        has_income_contingent_loan: i % 3 == 0,
        has_qualifying_insurance: i % 5 == 0,
        family_status: if i % 6 == 0 {
            FamilyStatus::Family
        } else {
            FamilyStatus::Single
        },
        dependant_count: (i % 4) as u32,
        ..CalculationInput::default()
    }
}

/// Benchmark: the reference calculation end to end.
fn bench_single_calculation(c: &mut Criterion) {
    let input = CalculationInput::default();

    c.bench_function("single_calculation", |b| {
        b.iter(|| black_box(calculate_tax(black_box(&input))))
    });
}

/// Benchmark: each calculator on its own.
fn bench_calculators(c: &mut Criterion) {
    let rules = RuleBook::builtin().expect("Failed to load rules");
    let rule_set = rules.get(RuleYear::Fy2025_26).expect("Missing rule-year");
    let input = CalculationInput::default();
    let income = Decimal::from(120_000);

    let mut group = c.benchmark_group("calculators");

    group.bench_function("income_tax", |b| {
        b.iter(|| black_box(calculate_income_tax(black_box(income), &input, rule_set, 1)))
    });
    group.bench_function("medicare_levy", |b| {
        b.iter(|| black_box(calculate_medicare_levy(black_box(income), &input, rule_set, 1)))
    });
    group.bench_function("surcharge", |b| {
        b.iter(|| black_box(calculate_surcharge(black_box(income), &input, rule_set, 1)))
    });
    for year in RuleYear::ALL {
        let schedule = rules.get(year).expect("Missing rule-year").loan_repayment();
        group.bench_with_input(
            BenchmarkId::new("loan_repayment", year),
            &income,
            |b, income| b.iter(|| black_box(repayment_for_income(*income, schedule))),
        );
    }

    group.finish();
}

/// Benchmark: batches of varied inputs.
fn bench_batches(c: &mut Criterion) {
    let rules = RuleBook::builtin().expect("Failed to load rules");

    let mut group = c.benchmark_group("batch_processing");

    for size in [100usize, 1_000] {
        let inputs: Vec<CalculationInput> = (0..size).map(create_input).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("inputs", size), &inputs, |b, inputs| {
            b.iter(|| {
                let results: Vec<_> = inputs
                    .iter()
                    .map(|input| calculate_tax_with_rules(input, rules))
                    .collect();
                black_box(results)
            })
        });
    }

    group.finish();
}

/// Benchmark: parsing and validating the embedded rule sets.
fn bench_rule_loading(c: &mut Criterion) {
    c.bench_function("load_builtin_rules", |b| {
        b.iter(|| black_box(ConfigLoader::builtin()))
    });
}

criterion_group!(
    benches,
    bench_single_calculation,
    bench_calculators,
    bench_batches,
    bench_rule_loading,
);
criterion_main!(benches);
