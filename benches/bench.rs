use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rocket::local::blocking::{Client, LocalResponse};

use anonboard::models::Registry;
use anonboard::validate::validate_post;
use anonboard::{new_instance, path, Config};

fn get_home<'c>(client: &'c Client) -> LocalResponse<'c> {
    client.get("/").dispatch()
}

pub fn bench_homepage(c: &mut Criterion) {
    let rocket = new_instance(Config::memory()).unwrap();
    let client = Client::tracked(rocket).expect("valid rocket instance");

    c.bench_function("home", |b| b.iter(|| get_home(black_box(&client))));
}

pub fn bench_core(c: &mut Criterion) {
    let registry = Registry::default();

    c.bench_function("resolve board", |b| {
        b.iter(|| {
            let segments = path::segments(black_box("/board/tech"));
            path::resolve_board(&segments, &registry).is_ok()
        })
    });

    c.bench_function("validate post", |b| {
        b.iter(|| validate_post(black_box("  a title "), black_box("\t\n")))
    });
}

criterion_group!(benches, bench_homepage, bench_core);
criterion_main!(benches);
