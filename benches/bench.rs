// Criterion benchmarks for Talent Algo

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use talent_algo::core::{AssignmentAlgorithm, CostMatrix, HungarianSolver, MatchEngine, MatchStrategy};
use talent_algo::models::{CandidateProfile, JobProfile};

fn create_candidate(id: usize) -> CandidateProfile {
    let mut c = CandidateProfile::new(format!("c{id}"));
    c.skills = match id % 3 {
        0 => vec!["rust".into(), "postgres".into()],
        1 => vec!["typescript".into(), "react".into()],
        _ => vec!["python".into(), "sql".into()],
    };
    c.experience_years = (id % 12) as f64;
    c.expected_salary = Some(55_000.0 + (id % 8) as f64 * 5_000.0);
    c.location = Some(if id % 2 == 0 { "Berlin" } else { "Amsterdam" }.into());
    c
}

fn create_job(id: usize) -> JobProfile {
    let mut j = JobProfile::new(format!("j{id}"));
    j.required_skills = match id % 3 {
        0 => vec!["rust".into(), "postgres".into()],
        1 => vec!["typescript".into(), "react".into()],
        _ => vec!["python".into(), "sql".into()],
    };
    j.min_experience = (id % 5) as f64;
    j.salary_range = Some((50_000.0, 90_000.0));
    j.location = Some(if id % 2 == 0 { "Berlin" } else { "Amsterdam" }.into());
    j
}

fn bench_matrix_generation(c: &mut Criterion) {
    let engine = MatchEngine::new();
    let mut group = c.benchmark_group("matrix_generation");

    for size in [10usize, 50, 100].iter() {
        let candidates: Vec<_> = (0..*size).map(create_candidate).collect();
        let jobs: Vec<_> = (0..*size).map(create_job).collect();

        group.bench_with_input(BenchmarkId::new("generate", size), size, |b, _| {
            b.iter(|| {
                engine
                    .generate_cost_matrix(black_box(&candidates), black_box(&jobs))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_hungarian_solver(c: &mut Criterion) {
    let solver = HungarianSolver::default();
    let mut group = c.benchmark_group("hungarian");

    for size in [10usize, 50, 100].iter() {
        let rows: Vec<Vec<f64>> = (0..*size)
            .map(|i| {
                (0..*size)
                    .map(|j| ((i * 31 + j * 17) % 100) as f64 / 100.0)
                    .collect()
            })
            .collect();
        let matrix = CostMatrix::from_rows(&rows).unwrap();

        group.bench_with_input(BenchmarkId::new("kuhn_munkres", size), size, |b, _| {
            b.iter(|| {
                solver
                    .solve(
                        black_box(&matrix),
                        AssignmentAlgorithm::KuhnMunkres,
                        false,
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_stable_matching(c: &mut Criterion) {
    let engine = MatchEngine::new();
    let mut group = c.benchmark_group("stable_matching");

    for size in [10usize, 50].iter() {
        let candidates: Vec<_> = (0..*size).map(create_candidate).collect();
        let jobs: Vec<_> = (0..*size).map(create_job).collect();
        let matrix = engine.generate_cost_matrix(&candidates, &jobs).unwrap();

        group.bench_with_input(BenchmarkId::new("candidate_optimal", size), size, |b, _| {
            b.iter(|| {
                engine
                    .find_matches(
                        black_box(&candidates),
                        black_box(&jobs),
                        MatchStrategy::CandidateOptimal,
                        Some(black_box(&matrix)),
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_matrix_generation,
    bench_hungarian_solver,
    bench_stable_matching
);

criterion_main!(benches);
