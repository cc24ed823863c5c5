use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weather_pipeline::analyzers::AnnualAccumulator;
use weather_pipeline::readers::parse_observation_line;

// One year of raw station lines, with every tenth reading missing
fn create_station_lines(days: usize) -> Vec<String> {
    let base_date = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap();
    (0..days)
        .map(|day| {
            let date = base_date + chrono::Duration::days(day as i64);
            let max_temp = -50 + (day as i64 % 300);
            let precipitation = if day % 10 == 0 { -9999 } else { (day as i64 * 7) % 400 };
            format!(
                "{}\t{:>5}\t{:>5}\t{:>5}",
                date.format("%Y%m%d"),
                max_temp,
                max_temp - 80,
                precipitation
            )
        })
        .collect()
}

fn benchmark_line_parsing(c: &mut Criterion) {
    let lines = create_station_lines(365);

    c.bench_function("parse_observation_line", |b| {
        b.iter(|| {
            let mut parsed = 0;
            for line in &lines {
                if parse_observation_line(black_box(line), "USC00110072").is_ok() {
                    parsed += 1;
                }
            }
            black_box(parsed)
        })
    });
}

fn benchmark_malformed_lines(c: &mut Criterion) {
    let lines = vec![
        "invalid\tdata",
        "19851301\t1\t2\t3",
        "19850101\t1.5\t2\t3",
        "19850101\t1\t2\t3\t4",
    ];

    c.bench_function("parse_malformed_lines", |b| {
        b.iter(|| {
            let failed = lines
                .iter()
                .filter(|line| parse_observation_line(black_box(line), "S").is_err())
                .count();
            black_box(failed)
        })
    });
}

fn benchmark_accumulation_by_days(c: &mut Criterion) {
    let mut group = c.benchmark_group("annual_accumulation_by_days");

    for &days in &[31, 365, 3650] {
        let observations: Vec<_> = create_station_lines(days)
            .iter()
            .filter_map(|line| parse_observation_line(line, "USC00110072").ok())
            .collect();

        group.bench_with_input(BenchmarkId::new("days", days), &observations, |b, obs| {
            b.iter(|| {
                let mut acc = AnnualAccumulator::new();
                for o in obs {
                    acc.add(o.max_temp, o.min_temp, o.precipitation);
                }
                black_box(acc.finish("USC00110072", 1985))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_malformed_lines,
    benchmark_accumulation_by_days
);
criterion_main!(benches);
