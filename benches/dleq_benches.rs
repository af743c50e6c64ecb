use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use curve25519_dalek::ristretto::RistrettoPoint as G;
use ff::Field;
use group::Group;
use rand::rngs::OsRng;

use sigma_compose::{Secret, SecretMap, Statement};

fn dlrep_prove_verify(c: &mut Criterion) {
    let mut rng = OsRng;
    let g = G::generator();
    let x = Secret::named("x");
    let witness = <G as Group>::Scalar::random(&mut rng);
    let y = g * witness;
    let stmt = Statement::dlrep(y, x.clone() * g).unwrap();

    let mut group = c.benchmark_group("dlrep");
    group.bench_function("prove", |b| {
        b.iter(|| {
            let map = SecretMap::new().with(&x, witness);
            black_box(stmt.prove(map, &mut rng).unwrap())
        })
    });

    let transcript = stmt.prove(SecretMap::new().with(&x, witness), &mut rng).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| black_box(stmt.verify(&transcript)))
    });
    group.finish();
}

fn dlrep_or_prove_verify(c: &mut Criterion) {
    let mut rng = OsRng;
    let g = G::generator();
    let x = Secret::named("x");
    let witness = <G as Group>::Scalar::random(&mut rng);
    let y = g * witness;

    let mut group = c.benchmark_group("dlrep_or");
    for arity in [2usize, 4, 8] {
        let mut children = vec![Statement::dlrep(y, x.clone() * g).unwrap()];
        for _ in 1..arity {
            let bogus = G::random(&mut rng);
            children.push(Statement::dlrep(bogus, x.clone() * g).unwrap());
        }
        let stmt = Statement::or(children);

        group.bench_with_input(BenchmarkId::new("prove", arity), &arity, |b, _| {
            b.iter(|| {
                let map = SecretMap::new().with(&x, witness);
                black_box(stmt.prove(map, &mut rng).unwrap())
            })
        });

        let transcript = stmt
            .prove(SecretMap::new().with(&x, witness), &mut rng)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("verify", arity), &arity, |b, _| {
            b.iter(|| black_box(stmt.verify(&transcript)))
        });
    }
    group.finish();
}

fn dlrne_prove_verify(c: &mut Criterion) {
    let mut rng = OsRng;
    let g0 = G::generator();
    let g1 = G::generator() * <G as Group>::Scalar::from(7u64);
    let x = Secret::named("x");
    let x_value = <G as Group>::Scalar::random(&mut rng);
    let y0 = g0 * x_value;
    // y1 picked independently of x_value so the discrete logs differ with
    // overwhelming probability.
    let y1 = g1 * <G as Group>::Scalar::random(&mut rng);
    let stmt = Statement::dlrep_not_equal(y0, g0, y1, g1, x.clone(), false);

    let mut group = c.benchmark_group("dlrne");
    group.bench_function("prove", |b| {
        b.iter(|| {
            let map = SecretMap::new().with(&x, x_value);
            black_box(stmt.prove(map, &mut rng).unwrap())
        })
    });

    let transcript = stmt
        .prove(SecretMap::new().with(&x, x_value), &mut rng)
        .unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| black_box(stmt.verify(&transcript)))
    });
    group.finish();
}

criterion_group!(benches, dlrep_prove_verify, dlrep_or_prove_verify, dlrne_prove_verify);
criterion_main!(benches);
