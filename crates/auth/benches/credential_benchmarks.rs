use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use keyward_auth::credential::{CredentialRegistry, Sha256SaltVerifier, Sha512SaltVerifier, scheme};
use keyward_auth::policy::{CasbinEngine, PolicyEngine};
use keyward_auth::PermissionGrant;

fn bench_registry_lookup(c: &mut Criterion) {
    let registry = CredentialRegistry::with_defaults();

    c.bench_function("registry_lookup_hit", |b| {
        b.iter(|| registry.get(black_box(scheme::SHA256_SALT)).is_some());
    });

    c.bench_function("registry_lookup_miss", |b| {
        b.iter(|| registry.get(black_box("md5-crypt")).is_some());
    });
}

fn bench_salted_digest_verification(c: &mut Criterion) {
    let registry = CredentialRegistry::with_defaults();
    let mut group = c.benchmark_group("salted_digest_verify");

    let cases = [
        (scheme::SHA256_SALT, Sha256SaltVerifier::derive("correct horse", "acct", "org")),
        (scheme::SHA512_SALT, Sha512SaltVerifier::derive("correct horse", "acct", "org")),
    ];

    for (name, stored) in &cases {
        let Some(verifier) = registry.get(name) else {
            continue;
        };
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("match", name), stored, |b, stored| {
            b.iter(|| verifier.verify(black_box("correct horse"), stored, "acct", "org"));
        });
        group.bench_with_input(BenchmarkId::new("mismatch", name), stored, |b, stored| {
            b.iter(|| verifier.verify(black_box("battery staple"), stored, "acct", "org"));
        });
    }

    group.finish();
}

fn bench_argon2id_verification(c: &mut Criterion) {
    let registry = CredentialRegistry::with_defaults();
    let salt = SaltString::from_b64("c2FsdHlzYWx0eXNhbHR5").unwrap();
    let stored = Argon2::default()
        .hash_password(b"correct horse", &salt)
        .unwrap()
        .to_string();
    let verifier = registry.get(scheme::ARGON2ID).unwrap();

    let mut group = c.benchmark_group("argon2id_verify");
    group.sample_size(10);
    group.bench_function("match", |b| {
        b.iter(|| verifier.verify(black_box("correct horse"), &stored, "", ""));
    });
    group.finish();
}

fn bench_policy_enforcement(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let grant = PermissionGrant::new("acme", "reports")
        .with_resources(["reports", "billing", "portal"])
        .with_principals(["acme/alice", "acme/bob", "globex/*"])
        .with_actions(["read", "write"]);
    let engine = runtime.block_on(CasbinEngine::from_grant(&grant)).unwrap();

    let mut group = c.benchmark_group("policy_enforce");
    group.bench_function("organization_entry", |b| {
        b.iter(|| engine.enforce(black_box("globex/zed"), "billing", "read"));
    });
    group.bench_function("no_match", |b| {
        b.iter(|| engine.enforce(black_box("initech/peter"), "billing", "read"));
    });
    group.finish();

    c.bench_function("policy_enforcer_build", |b| {
        b.iter(|| runtime.block_on(CasbinEngine::from_grant(black_box(&grant))));
    });
}

criterion_group!(
    benches,
    bench_registry_lookup,
    bench_salted_digest_verification,
    bench_argon2id_verification,
    bench_policy_enforcement
);
criterion_main!(benches);
